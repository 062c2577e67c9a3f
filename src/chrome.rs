//! Chrome engine – renders through a headless Chrome/Chromium launched with
//! `headless_chrome`.
//!
//! Every render launches its own browser, so a browser instance is never
//! shared between documents. The HTML is written to a temporary file and
//! loaded from there; printing starts once the page's network has gone idle.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use url::Url;

use crate::error::EngineError;
use crate::gateway::RenderEngine;
use crate::options::RenderOptions;

const IDLE_POLL: Duration = Duration::from_millis(50);

/// Browser launch and load settings.
#[derive(Debug, Clone)]
pub struct ChromeConfig {
    /// Browser executable. Auto-detected when `None`.
    pub executable: Option<PathBuf>,
    /// Run with the Chrome sandbox (default: true). Containers running as
    /// root usually need this off.
    pub sandbox: bool,
    /// How long to wait for navigation and network idle (default: 30 s).
    pub load_timeout: Duration,
    /// Browser is killed after this long without DevTools traffic
    /// (default: 60 s).
    pub idle_browser_timeout: Duration,
    /// Extra command-line switches, e.g. `--font-render-hinting=none`.
    pub extra_args: Vec<String>,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            executable: None,
            sandbox: true,
            load_timeout: Duration::from_secs(30),
            idle_browser_timeout: Duration::from_secs(60),
            extra_args: Vec::new(),
        }
    }
}

/// [`RenderEngine`] backed by headless Chrome.
#[derive(Debug, Clone, Default)]
pub struct ChromeEngine {
    config: ChromeConfig,
}

impl ChromeEngine {
    pub fn new(config: ChromeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChromeConfig {
        &self.config
    }

    fn launch(&self) -> Result<Browser, EngineError> {
        let args: Vec<&std::ffi::OsStr> = self
            .config
            .extra_args
            .iter()
            .map(|a| std::ffi::OsStr::new(a.as_str()))
            .collect();

        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.config.sandbox)
            .path(self.config.executable.clone())
            .idle_browser_timeout(self.config.idle_browser_timeout)
            .args(args)
            .build()
            .map_err(|e| EngineError::Unavailable(format!("invalid launch options: {e}")))?;

        Browser::new(launch_options)
            .map_err(|e| EngineError::Unavailable(format!("could not launch browser: {e:#}")))
    }
}

impl RenderEngine for ChromeEngine {
    fn name(&self) -> &str {
        "chrome"
    }

    fn render(&self, html: &str, options: &RenderOptions) -> Result<Vec<u8>, EngineError> {
        let mut page_file = tempfile::Builder::new()
            .prefix("html-press-")
            .suffix(".html")
            .tempfile()?;
        page_file.write_all(html.as_bytes())?;
        page_file.flush()?;

        let url = Url::from_file_path(page_file.path())
            .map_err(|_| {
                EngineError::Render(format!(
                    "cannot address {} as a file URL",
                    page_file.path().display()
                ))
            })?
            .to_string();

        let browser = self.launch()?;
        let tab = browser
            .new_tab()
            .map_err(|e| EngineError::Unavailable(format!("could not open tab: {e:#}")))?;
        tab.set_default_timeout(self.config.load_timeout);

        // `init` marks a new document; `networkIdle` fires after 500 ms with
        // no network connections. Lifecycle events replayed for the initial
        // blank page arrive before our navigation's `init`.
        let idle = Arc::new(AtomicBool::new(false));
        let listener_idle = Arc::clone(&idle);
        tab.call_method(Page::SetLifecycleEventsEnabled { enabled: true })
            .map_err(|e| EngineError::Render(format!("lifecycle events: {e:#}")))?;
        tab.add_event_listener(Arc::new(move |event: &Event| {
            if let Event::PageLifecycleEvent(lifecycle) = event {
                match lifecycle.params.name.as_str() {
                    "init" => listener_idle.store(false, Ordering::SeqCst),
                    "networkIdle" => listener_idle.store(true, Ordering::SeqCst),
                    _ => {}
                }
            }
        }))
        .map_err(|e| EngineError::Render(format!("event listener: {e:#}")))?;

        log::debug!("Loading {url}");
        let started = Instant::now();
        tab.navigate_to(&url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| EngineError::Timeout(format!("navigation: {e:#}")))?;

        while !idle.load(Ordering::SeqCst) {
            if started.elapsed() >= self.config.load_timeout {
                return Err(EngineError::Timeout(format!(
                    "network did not go idle within {:?}",
                    self.config.load_timeout
                )));
            }
            std::thread::sleep(IDLE_POLL);
        }
        log::debug!("Network idle after {:?}", started.elapsed());

        tab.print_to_pdf(Some(print_options(options)))
            .map_err(|e| EngineError::Render(format!("{e:#}")))
    }
}

/// Translate [`RenderOptions`] into DevTools `Page.printToPDF` parameters
/// (sizes in inches; Chrome applies `landscape` itself).
fn print_options(options: &RenderOptions) -> PrintToPdfOptions {
    let (paper_width, paper_height) = options.base_size_inches();
    let margin = &options.margin;

    PrintToPdfOptions {
        landscape: Some(options.landscape),
        display_header_footer: Some(options.display_header_footer),
        print_background: Some(options.print_background),
        scale: Some(options.scale),
        paper_width: Some(paper_width),
        paper_height: Some(paper_height),
        margin_top: Some(margin.top.to_inches()),
        margin_bottom: Some(margin.bottom.to_inches()),
        margin_left: Some(margin.left.to_inches()),
        margin_right: Some(margin.right.to_inches()),
        page_ranges: options.page_ranges.clone(),
        header_template: options.header_template.clone(),
        footer_template: options.footer_template.clone(),
        prefer_css_page_size: Some(options.prefer_css_page_size),
        ..Default::default()
    }
}

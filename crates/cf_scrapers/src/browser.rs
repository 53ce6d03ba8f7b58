use async_trait::async_trait;
use cf_core::{ContentSource, Error, PageCapture, Result};
use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};
use crate::text::extract_body_text;
use crate::utils::parse_url;

const PAGE_SIZE_SCRIPT: &str =
    "JSON.stringify([document.documentElement.scrollWidth, document.documentElement.scrollHeight])";

/// Renders pages in headless Chromium.
#[derive(Debug, Clone)]
pub struct BrowserSource {
    headless: bool,
}

impl BrowserSource {
    pub fn new() -> Self {
        Self { headless: true }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}

impl Default for BrowserSource {
    fn default() -> Self {
        Self::new()
    }
}

const DEFAULT_PAGE_SIZE: (u32, u32) = (1280, 800);

fn page_size(value: Option<&serde_json::Value>) -> (u32, u32) {
    value
        .and_then(|v| v.as_str())
        .and_then(|s| serde_json::from_str::<(u32, u32)>(s).ok())
        .filter(|&(width, height)| width > 0 && height > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Grow the emulated viewport to the whole document. Chrome only paints
/// what is inside the viewport, so a clip alone leaves the rest blank.
fn fit_viewport(tab: &Tab, (width, height): (u32, u32)) -> anyhow::Result<()> {
    tab.call_method(Emulation::SetDeviceMetricsOverride {
        width,
        height,
        device_scale_factor: 1.0,
        mobile: false,
        scale: None,
        screen_width: None,
        screen_height: None,
        position_x: None,
        position_y: None,
        dont_set_visible_size: None,
        screen_orientation: None,
        viewport: None,
        display_feature: None,
        device_posture: None,
    })?;
    Ok(())
}

fn capture(url: &str, headless: bool) -> anyhow::Result<PageCapture> {
    let options = LaunchOptions::default_builder()
        .headless(headless)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid browser options: {}", e))?;
    let browser = Browser::new(options)?;
    let tab = browser.new_tab()?;

    tab.navigate_to(url)?.wait_until_navigated()?;

    let size = tab.evaluate(PAGE_SIZE_SCRIPT, false)?;
    let size = page_size(size.value.as_ref());
    tracing::debug!("Page size {}x{}", size.0, size.1);
    fit_viewport(&tab, size)?;

    let screenshot = tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)?;

    let html = tab.get_content()?;
    let text = extract_body_text(&html)?;

    Ok(PageCapture { screenshot, text })
}

#[async_trait]
impl ContentSource for BrowserSource {
    fn name(&self) -> &str {
        "headless-chrome"
    }

    async fn fetch(&self, url: &str) -> Result<PageCapture> {
        parse_url(url)?;
        let url = url.to_string();
        let headless = self.headless;

        tracing::info!("🌐 Rendering {}", url);
        let page = tokio::task::spawn_blocking(move || capture(&url, headless))
            .await
            .map_err(|e| Error::Scraping(format!("Browser task failed: {}", e)))?
            .map_err(|e| Error::Scraping(format!("Failed to render page: {:#}", e)))?;
        tracing::info!(
            "📸 Captured {} byte screenshot and {} characters of text",
            page.screenshot.len(),
            page.text.chars().count()
        );
        Ok(page)
    }
}

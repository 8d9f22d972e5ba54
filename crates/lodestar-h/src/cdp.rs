use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

type CdpResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Fixed window so screenshot pixels map onto the same layout on every run.
const WINDOW_SIZE: (u32, u32) = (1280, 900);

/// Where the browser profile lives. Ephemeral profiles are removed on close.
#[derive(Debug)]
enum Profile {
    Provided(PathBuf),
    Ephemeral(PathBuf),
}

impl Profile {
    fn resolve() -> CdpResult<Self> {
        if let Ok(dir) = std::env::var("LODESTAR_USER_DATA_DIR") {
            let path = PathBuf::from(dir);
            std::fs::create_dir_all(&path)?;
            tracing::info!("Reusing browser profile at {}", path.display());
            return Ok(Profile::Provided(path));
        }

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| format!("System clock error: {}", e))?
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "lodestar-profile-{}-{}",
            std::process::id(),
            nanos
        ));
        std::fs::create_dir_all(&path)?;
        tracing::debug!("Created throwaway browser profile {}", path.display());
        Ok(Profile::Ephemeral(path))
    }

    fn path(&self) -> &Path {
        match self {
            Profile::Provided(p) | Profile::Ephemeral(p) => p,
        }
    }

    fn discard(self) {
        if let Profile::Ephemeral(dir) = self
            && let Err(e) = std::fs::remove_dir_all(&dir)
        {
            tracing::debug!("Could not remove profile {}: {}", dir.display(), e);
        }
    }
}

/// A launched Chromium instance driving a single page.
pub struct CdpClient {
    pub browser: Browser,
    pub page: Page,
    handler_task: JoinHandle<()>,
    profile: Profile,
}

impl CdpClient {
    pub async fn launch(visible: bool) -> CdpResult<Self> {
        let profile = Profile::resolve()?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(WINDOW_SIZE.0, WINDOW_SIZE.1)
            .user_data_dir(profile.path());
        if visible {
            builder = builder.with_head();
        }
        if let Ok(chrome_bin) = std::env::var("CHROME_BIN") {
            tracing::info!("Using Chrome binary from CHROME_BIN: {}", chrome_bin);
            builder = builder.chrome_executable(chrome_bin);
        }
        let config = builder
            .build()
            .map_err(|e| format!("Failed to build browser config: {}", e))?;

        tracing::info!(
            "Launching Chromium ({})",
            if visible { "visible" } else { "headless" }
        );
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| format!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::error!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::debug!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("Failed to open page: {}", e))?;
        accept_dialogs(&page).await?;

        Ok(Self {
            browser,
            page,
            handler_task,
            profile,
        })
    }

    pub async fn close(mut self) -> CdpResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| format!("Error closing browser: {}", e))?;
        self.handler_task
            .await
            .map_err(|e| format!("Error awaiting handler: {}", e))?;
        self.profile.discard();
        Ok(())
    }
}

/// A pending alert or confirm blocks every evaluation until it is answered.
async fn accept_dialogs(page: &Page) -> CdpResult<()> {
    let mut dialogs = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| format!("Failed to subscribe to dialog events: {}", e))?;

    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = dialogs.next().await {
            tracing::info!("Accepting {:?} dialog: {}", event.r#type, event.message);
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                tracing::warn!("Failed to accept dialog: {}", e);
            }
        }
    });
    Ok(())
}

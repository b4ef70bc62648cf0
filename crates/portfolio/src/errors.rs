//! Global error listener.

use page_runtime::{EventKind, EventTarget, ListenerId, LogLevel, Page};

/// Log every uncaught page error to the console. Nothing else happens to it.
pub fn install(page: &mut Page) -> ListenerId {
    page.add_event_listener(EventTarget::Window, EventKind::Error, |page, event| {
        let message = event.message.as_deref().unwrap_or("unknown error");
        page.write_console(
            LogLevel::Error,
            format!("JavaScript error occurred: {message}"),
        );
        Ok(())
    })
}

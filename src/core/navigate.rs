//! Opening bookmarks outside the viewer.

use std::io;

use rand::Rng;

use super::models::Bookmark;

/// Something that can open a URL in a separate browsing context.
pub trait Navigator {
    fn open(&mut self, url: &str) -> io::Result<()>;
}

/// Opens URLs in the system's default browser. The browser runs as its own
/// process, so the viewer has no opener relationship and sends no referrer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl Navigator for SystemBrowser {
    fn open(&mut self, url: &str) -> io::Result<()> {
        open::that_detached(url)
    }
}

/// Uniformly random bookmark from the current view, or `None` when empty.
pub fn pick_random<'a, R: Rng>(items: &'a [Bookmark], rng: &mut R) -> Option<&'a Bookmark> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.gen_range(0..items.len()))
}

/// Open `bookmark` through `navigator`. Malformed URLs are still handed to
/// the navigator; failures are logged and returned, never panicked on.
pub fn open_bookmark<N: Navigator + ?Sized>(navigator: &mut N, bookmark: &Bookmark) -> io::Result<()> {
    log::info!("Opening {}", bookmark.url);
    navigator.open(&bookmark.url).map_err(|e| {
        log::warn!("Failed to open {}: {e}", bookmark.url);
        e
    })
}

/// Pick a random bookmark and open it. Does nothing on an empty view.
pub fn open_random<'a, N, R>(
    items: &'a [Bookmark],
    rng: &mut R,
    navigator: &mut N,
) -> io::Result<Option<&'a Bookmark>>
where
    N: Navigator + ?Sized,
    R: Rng,
{
    let Some(bookmark) = pick_random(items, rng) else {
        log::debug!("Random pick skipped: no bookmarks in view");
        return Ok(None);
    };
    open_bookmark(navigator, bookmark)?;
    Ok(Some(bookmark))
}

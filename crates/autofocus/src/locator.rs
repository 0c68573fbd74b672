//! Target lookup

use crate::options::DEFAULT_TARGET;
use crate::platform::Platform;

/// Find the element that should receive focus
///
/// The host wins when it matches `selector` itself; otherwise the first
/// matching descendant in document order. An invalid selector is not an
/// error: the descendants are searched with [`DEFAULT_TARGET`] instead.
/// Validity is whatever the platform's selector engine accepts; for the
/// headless page that is the syntax listed in `autofocus_dom::selector`.
pub fn find_target<P: Platform>(
    platform: &P,
    host: &P::Element,
    selector: &str,
) -> Option<P::Element> {
    let located = platform.matches(host, selector).and_then(|is_match| {
        if is_match {
            Ok(Some(host.clone()))
        } else {
            platform.query_selector(host, selector)
        }
    });

    match located {
        Ok(target) => target,
        Err(err) => {
            tracing::debug!("{}; falling back to `{}`", err, DEFAULT_TARGET);
            platform.query_selector(host, DEFAULT_TARGET).ok().flatten()
        }
    }
}

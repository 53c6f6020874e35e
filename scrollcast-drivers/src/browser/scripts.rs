/// JavaScript snippets executed in the page through WebDriver `execute`.
///
/// Each snippet is a function body: arguments arrive as `arguments[n]` and
/// the result is whatever the body `return`s.
pub struct PageScripts;

impl PageScripts {
    /// Scroll offset, viewport height and document height in whole pixels.
    ///
    /// The offset rounds up so a fractional offset at the end of the page
    /// still reaches the document height.
    pub fn metrics() -> &'static str {
        r#"
            const body = document.body;
            const root = document.documentElement;
            const documentHeight = Math.max(
                body ? body.scrollHeight : 0,
                root ? root.scrollHeight : 0
            );
            return {
                scrollY: Math.max(0, Math.ceil(window.scrollY || window.pageYOffset || 0)),
                viewportHeight: Math.max(0, Math.round(window.innerHeight)),
                documentHeight: Math.max(0, Math.round(documentHeight))
            };
        "#
    }

    /// Eased scroll by `arguments[0]` pixels.
    pub fn scroll_by_smooth() -> &'static str {
        r#"
            window.scrollBy({ top: arguments[0], left: 0, behavior: 'smooth' });
            return null;
        "#
    }

    pub fn scroll_to_top() -> &'static str {
        r#"
            window.scrollTo(0, 0);
            return null;
        "#
    }

    /// Load progress used by the network-idle heuristic.
    ///
    /// The first call lifts the resource timing buffer cap (250 entries by
    /// default) and starts a `PerformanceObserver` that keeps a running total,
    /// so the count keeps moving on pages that load many resources.
    pub fn load_progress() -> &'static str {
        r#"
            const perf = window.performance;
            let tally = window.__scrollcastResources;
            if (!tally) {
                tally = { count: 0, observed: false };
                window.__scrollcastResources = tally;
                if (perf && perf.setResourceTimingBufferSize) {
                    perf.setResourceTimingBufferSize(100000);
                }
                if (perf && perf.getEntriesByType) {
                    tally.count = perf.getEntriesByType('resource').length;
                }
                try {
                    new PerformanceObserver((list) => {
                        tally.count += list.getEntries().length;
                    }).observe({ type: 'resource' });
                    tally.observed = true;
                } catch (e) {}
            }
            const resources = tally.observed
                ? tally.count
                : (perf && perf.getEntriesByType ? perf.getEntriesByType('resource').length : 0);
            return { readyState: document.readyState, resources: resources };
        "#
    }

    pub fn ready_state() -> &'static str {
        "return document.readyState;"
    }
}

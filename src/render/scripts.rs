//! JavaScript evaluated inside rendered pages

/// Installed before any page script runs. Wraps `console.error/warn/log`
/// and records each call as `{type, text}` in `window.__consoleMessages`.
pub const CONSOLE_CAPTURE: &str = r"(() => {
    window.__consoleMessages = [];
    const wrap = (method, type) => {
        const original = console[method];
        console[method] = function (...args) {
            window.__consoleMessages.push({ type, text: args.join(' ') });
            return original.apply(console, args);
        };
    };
    wrap('error', 'error');
    wrap('warn', 'warning');
    wrap('log', 'log');
})();";

/// Reads captured console messages
pub const CONSOLE_READ: &str = "window.__consoleMessages || []";

/// Navigation timing offsets from `navigationStart`. A field is `null` when
/// its event has not happened yet.
pub const NAVIGATION_TIMING: &str = r"(() => {
    const t = window.performance.timing;
    const since = (v) => (v > 0 && t.navigationStart > 0 ? v - t.navigationStart : null);
    return {
        ttfb: since(t.responseStart),
        domContentLoaded: since(t.domContentLoadedEventEnd),
        loadEvent: since(t.loadEventEnd),
    };
})()";

/// Milliseconds since navigation start
pub const PERFORMANCE_NOW: &str = "performance.now()";

/// Script removing every element matching `selector`; returns the number removed.
///
/// The selector is embedded as a JSON string so quotes cannot break out.
#[must_use]
pub fn strip_selector(selector: &str) -> String {
    let quoted = serde_json::Value::String(selector.to_string()).to_string();
    format!(
        "(() => {{ const nodes = document.querySelectorAll({quoted}); \
         nodes.forEach((n) => n.remove()); return nodes.length; }})()"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_is_json_quoted() {
        let script = strip_selector(r#"a[href="x"]"#);
        assert!(script.contains(r#"querySelectorAll("a[href=\"x\"]")"#));
    }
}

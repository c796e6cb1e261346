//! Client/server render-mode classification.
//!
//! A pure heuristic over page source text. The decision order is:
//!
//! 1. A top-of-file directive (`"use client"` / `"use server"`), after
//!    leading blank lines and comments, decides outright.
//! 2. Otherwise any client-only pattern forces [`RenderMode::Client`]:
//!    interactive-state hooks, browser globals, event-handler props and
//!    client-only library imports.
//! 3. Otherwise the page is [`RenderMode::Server`].
//!
//! The pattern list is closed; unknown APIs classify as server.

use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// How a route is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Server,
    Client,
}

impl RenderMode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

/// Client-only source patterns, checked when no directive is present.
const CLIENT_PATTERNS: &[&str] = &[
    // interactive-state and navigation hooks
    r"\buse(State|Effect|LayoutEffect|Reducer|Ref|Context|Transition|DeferredValue|SyncExternalStore|Optimistic|FormStatus|ActionState|Router|Pathname|SearchParams|Params)\s*[(<]",
    // browser globals
    r"\b(window|document|navigator)\s*\.",
    r"\b(localStorage|sessionStorage)\b",
    // event-handler props
    r"\bon[A-Z][A-Za-z]*\s*=\s*\{",
    // client-only libraries
    r#"from\s+['"](framer-motion|react-hot-toast|react-toastify|react-quill|react-chartjs-2|chart\.js|@headlessui/react|@tiptap/[^'"]*|swiper[^'"]*)['"]"#,
];

static CLIENT_SET: LazyLock<RegexSet> =
    LazyLock::new(|| RegexSet::new(CLIENT_PATTERNS).expect("client patterns are valid"));

/// Explicit directive at the top of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Client,
    Server,
}

/// Classify page source text.
pub fn classify_render_mode(source: &str) -> RenderMode {
    match leading_directive(source) {
        Some(Directive::Client) => return RenderMode::Client,
        Some(Directive::Server) => return RenderMode::Server,
        None => {}
    }

    if CLIENT_SET.is_match(source) {
        RenderMode::Client
    } else {
        RenderMode::Server
    }
}

/// Find the directive on the first significant line, if any.
fn leading_directive(source: &str) -> Option<Directive> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut in_block_comment = false;

    for line in source.lines() {
        let mut line = line.trim();

        if in_block_comment {
            match line.find("*/") {
                Some(end) => {
                    in_block_comment = false;
                    line = line[end + 2..].trim();
                }
                None => continue,
            }
        }

        if line.starts_with("/*") {
            match line.find("*/") {
                Some(end) => line = line[end + 2..].trim(),
                None => {
                    in_block_comment = true;
                    continue;
                }
            }
        }

        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let statement = line.trim_end_matches(';').trim();
        return match statement {
            r#""use client""# | "'use client'" => Some(Directive::Client),
            r#""use server""# | "'use server'" => Some(Directive::Server),
            _ => None,
        };
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_server_component() {
        let src = r#"
import { Hero } from "@/components/hero";

export default function Page() {
  return <Hero title="Welcome" />;
}
"#;
        assert_eq!(classify_render_mode(src), RenderMode::Server);
    }

    #[test]
    fn test_use_client_directive() {
        assert_eq!(
            classify_render_mode("\"use client\";\nexport default () => null;"),
            RenderMode::Client
        );
        assert_eq!(
            classify_render_mode("'use client'\nexport default () => null;"),
            RenderMode::Client
        );
    }

    #[test]
    fn test_directive_after_comments() {
        let src = "// Copyright Acme\n/* multi\n   line */\n\n'use client';\n";
        assert_eq!(classify_render_mode(src), RenderMode::Client);
    }

    #[test]
    fn test_directive_not_on_first_statement_is_ignored() {
        let src = "import x from 'y';\n'use client';\nexport default x;";
        assert_eq!(classify_render_mode(src), RenderMode::Server);
    }

    #[test]
    fn test_use_server_overrides_patterns() {
        let src = "\"use server\";\nconst onClick = () => window.location;";
        assert_eq!(classify_render_mode(src), RenderMode::Server);
    }

    #[test]
    fn test_hooks_force_client() {
        let src = "export default function P() { const [a, set] = useState(0); return a; }";
        assert_eq!(classify_render_mode(src), RenderMode::Client);
        let src = "const r = useRef<HTMLDivElement>(null);";
        assert_eq!(classify_render_mode(src), RenderMode::Client);
    }

    #[test]
    fn test_browser_globals_force_client() {
        assert_eq!(
            classify_render_mode("const w = window.innerWidth;"),
            RenderMode::Client
        );
        assert_eq!(
            classify_render_mode("localStorage.getItem('k')"),
            RenderMode::Client
        );
    }

    #[test]
    fn test_event_handler_forces_client() {
        let src = "return <button onClick={() => go()}>Go</button>;";
        assert_eq!(classify_render_mode(src), RenderMode::Client);
    }

    #[test]
    fn test_client_library_import_forces_client() {
        let src = "import { motion } from 'framer-motion';";
        assert_eq!(classify_render_mode(src), RenderMode::Client);
        let src = "import StarterKit from \"@tiptap/starter-kit\";";
        assert_eq!(classify_render_mode(src), RenderMode::Client);
    }

    #[test]
    fn test_lookalikes_stay_server() {
        // identifiers that merely contain the pattern words
        let src = "const userState = getUserState(); const windowed = 1; const x = { onclick: 1 };";
        assert_eq!(classify_render_mode(src), RenderMode::Server);
    }

    #[test]
    fn test_bom_is_ignored() {
        assert_eq!(
            classify_render_mode("\u{feff}\"use client\";"),
            RenderMode::Client
        );
    }
}

use std::fmt;

use maud::html;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HintKind {
    /// Needed for the current page; fetch now.
    Preload,
    /// Likely needed soon; fetch when idle.
    Prefetch,
}

impl HintKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preload => "preload",
            Self::Prefetch => "prefetch",
        }
    }
}

/// What the hinted resource will be used as (`as=` attribute).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HintDestination {
    Image,
    Document,
    Font,
    Style,
}

impl HintDestination {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Font => "font",
            Self::Style => "style",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FetchPriority {
    High,
    #[default]
    Auto,
    Low,
}

impl FetchPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Auto => "auto",
            Self::Low => "low",
        }
    }
}

/// One advisory fetch hint. Ignoring it is always correct.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FetchHint {
    pub url: Url,
    pub kind: HintKind,
    pub destination: HintDestination,
    pub priority: FetchPriority,
}

impl FetchHint {
    pub fn preload(url: Url, destination: HintDestination, priority: FetchPriority) -> Self {
        Self {
            url,
            kind: HintKind::Preload,
            destination,
            priority,
        }
    }

    pub fn prefetch(url: Url, destination: HintDestination) -> Self {
        Self {
            url,
            kind: HintKind::Prefetch,
            destination,
            priority: FetchPriority::Low,
        }
    }

    /// Render as an HTML `<link>` element.
    pub fn to_link_tag(&self) -> String {
        let priority = (self.priority != FetchPriority::Auto).then(|| self.priority.as_str());
        html! {
            link
                rel=(self.kind.as_str())
                as=(self.destination.as_str())
                href=(self.url.as_str())
                fetchpriority=[priority];
        }
        .into_string()
    }
}

impl fmt::Display for FetchHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_link_tag())
    }
}

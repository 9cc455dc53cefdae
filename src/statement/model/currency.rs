use std::fmt::Display;

#[derive(Clone, Debug)]
enum CurrImpl {
    Static(&'static str),
    Dyn(String),
}

/// An ISO currency code as it appears in a statement, upper-cased.
#[derive(Clone, Debug)]
pub struct Currency(CurrImpl);

impl Currency {
    pub fn new(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "" => Currency::default(),
            "CHF" => Currency::chf(),
            "USD" => Currency::usd(),
            "EUR" => Currency::eur(),
            other => Currency(CurrImpl::Dyn(other.to_string())),
        }
    }

    pub fn chf() -> Self {
        Currency(CurrImpl::Static("CHF"))
    }

    pub fn usd() -> Self {
        Currency(CurrImpl::Static("USD"))
    }

    pub fn eur() -> Self {
        Currency(CurrImpl::Static("EUR"))
    }

    pub fn default() -> Self {
        Currency::chf()
    }

    pub fn is_default(&self) -> bool {
        *self == Currency::default()
    }

    pub fn as_str(&self) -> &str {
        match &self.0 {
            CurrImpl::Static(s) => s,
            CurrImpl::Dyn(s) => s.as_str(),
        }
    }

    // Cash Report rows carry an aggregate pseudo-currency
    // ("Base Currency Summary") next to the per-currency rows.
    pub fn is_summary_pseudo_currency(&self) -> bool {
        self.as_str().contains("SUMMARY")
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Currency {}

impl std::hash::Hash for Currency {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl PartialOrd for Currency {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Currency {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

// Auto-implements to_string()
impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for Currency {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

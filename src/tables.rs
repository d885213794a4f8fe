//! Lookup tables for field extraction.
//!
//! Keyword sets, regex families and known titles are compiled once and shared
//! read-only between all regions and worker threads.

use regex::Regex;
use std::sync::OnceLock;

use crate::widget::{Category, Trend};

static TABLES: OnceLock<ExtractionTables> = OnceLock::new();

/// Keywords that put a widget into a category. Matched as lowercase substrings.
#[derive(Debug)]
pub struct CategoryRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub category: Category,
}

/// Rules are checked in this order; the first keyword hit wins.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        name: "cpu",
        keywords: &["cpu", "processor", "core", "cpu usage", "cpu utilization"],
        category: Category::Infrastructure,
    },
    CategoryRule {
        name: "memory",
        keywords: &["memory", "ram", "mem", "memory usage", "memory utilization"],
        category: Category::System,
    },
    CategoryRule {
        name: "disk",
        keywords: &["disk", "storage", "disk usage", "disk space", "filesystem"],
        category: Category::Storage,
    },
    CategoryRule {
        name: "network",
        keywords: &["network", "bandwidth", "eth", "traffic", "network traffic"],
        category: Category::Network,
    },
    CategoryRule {
        name: "response_time",
        keywords: &["response", "latency", "response time", "avg response"],
        category: Category::Performance,
    },
    CategoryRule {
        name: "throughput",
        keywords: &["throughput", "requests", "req/s", "rps", "requests per second"],
        category: Category::Performance,
    },
    CategoryRule {
        name: "error_rate",
        keywords: &["error", "errors", "error rate", "failed", "failure rate"],
        category: Category::Reliability,
    },
    CategoryRule {
        name: "load",
        keywords: &["load", "load average", "system load", "load avg"],
        category: Category::Infrastructure,
    },
    CategoryRule {
        name: "database",
        keywords: &["database", "db", "connections", "queries", "sql"],
        category: Category::Database,
    },
    CategoryRule {
        name: "cache",
        keywords: &["cache", "hit rate", "cache hit", "redis", "memcache"],
        category: Category::Performance,
    },
];

#[derive(Debug)]
pub struct TrendRule {
    pub trend: Trend,
    pub keywords: &'static [&'static str],
}

/// Spike words outrank rising/falling, which outrank the status words.
pub const TREND_RULES: &[TrendRule] = &[
    TrendRule {
        trend: Trend::Spiking,
        keywords: &["spike", "spiking", "peak", "surge", "sudden increase", "sharp rise"],
    },
    TrendRule {
        trend: Trend::Rising,
        keywords: &["rising", "increasing", "growing", "up", "higher", "climbing"],
    },
    TrendRule {
        trend: Trend::Falling,
        keywords: &["falling", "decreasing", "dropping", "down", "lower", "declining"],
    },
    TrendRule {
        trend: Trend::Stable,
        keywords: &["stable", "steady", "constant", "flat", "normal"],
    },
    TrendRule {
        trend: Trend::Critical,
        keywords: &["critical", "alert", "danger", "high", "warning"],
    },
    TrendRule {
        trend: Trend::Normal,
        keywords: &["ok", "good", "healthy", "normal", "nominal"],
    },
];

/// Common panel titles. Earlier entries win when several are contained in a line.
pub const KNOWN_TITLES: &[&str] = &[
    "CPU Usage",
    "CPU Utilization",
    "Memory Usage",
    "Memory Utilization",
    "Disk Usage",
    "Disk Space",
    "Network Traffic",
    "Network I/O",
    "Response Time",
    "Average Response Time",
    "Throughput",
    "Requests/sec",
    "Error Rate",
    "Error Count",
    "Load Average",
    "System Load",
    "Database Connections",
    "Cache Hit Rate",
    "Queue Length",
    "Concurrent Users",
    "Active Sessions",
    "Bandwidth Usage",
];

/// Words that make an arbitrary line look like a panel title.
pub const WIDGET_WORDS: &[&str] = &["usage", "rate", "time", "count", "average", "total", "load"];

/// Numeric value families, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Percentage,
    Memory,
    Time,
    Rate,
    Network,
    Number,
}

/// Capture group 1 is the number, group 2 (if any) the unit.
const VALUE_PATTERNS: &[(ValueKind, &str)] = &[
    (ValueKind::Percentage, r"(?i)(\d+(?:\.\d+)?)\s*%"),
    (ValueKind::Memory, r"(?i)(\d+(?:\.\d+)?)\s*(KB|MB|GB|TB)\b"),
    (ValueKind::Time, r"(?i)(\d+(?:\.\d+)?)\s*(ms|s|m|h)\b"),
    (ValueKind::Rate, r"(?i)(\d+(?:\.\d+)?)\s*(req/s|rps|ops/s|tx/s|rx/s)"),
    (ValueKind::Network, r"(?i)(\d+(?:\.\d+)?)\s*(bps|Kbps|Mbps|Gbps)\b"),
    (ValueKind::Number, r"\b(\d+(?:\.\d+)?)\b"),
];

/// `HH:MM[:SS][ AM|PM]` variants, most specific first.
const TIME_PATTERNS: &[&str] = &[
    r"(?i)(\d{1,2}:\d{2}(?::\d{2})?)\s*(AM|PM)?",
    r"(?i)at\s+(\d{1,2}:\d{2})",
    r"(\d{1,2}:\d{2})",
];

#[derive(Debug)]
pub struct ValueFamily {
    pub kind: ValueKind,
    pub pattern: Regex,
}

/// Everything the field extractor looks things up in.
#[derive(Debug)]
pub struct ExtractionTables {
    pub categories: &'static [CategoryRule],
    pub trends: &'static [TrendRule],
    pub known_titles: &'static [&'static str],
    pub widget_words: &'static [&'static str],
    pub values: Vec<ValueFamily>,
    pub time_patterns: Vec<Regex>,
    /// Lines starting like this are never free-form titles
    pub leading_symbol: Regex,
    /// Lines that are just a number (optionally with `%`/decimals)
    pub leading_numeric: Regex,
}

impl ExtractionTables {
    pub fn new() -> Result<Self, regex::Error> {
        let values = VALUE_PATTERNS
            .iter()
            .map(|&(kind, pattern)| {
                Ok(ValueFamily {
                    kind,
                    pattern: Regex::new(pattern)?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let time_patterns = TIME_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            categories: CATEGORY_RULES,
            trends: TREND_RULES,
            known_titles: KNOWN_TITLES,
            widget_words: WIDGET_WORDS,
            values,
            time_patterns,
            leading_symbol: Regex::new(r"^[\d%$\-+]")?,
            leading_numeric: Regex::new(r"^\d+[%.\d]*")?,
        })
    }

    /// Process-wide tables, compiled on first use.
    pub fn shared() -> Result<&'static ExtractionTables, regex::Error> {
        if let Some(tables) = TABLES.get() {
            return Ok(tables);
        }
        let built = Self::new()?;
        Ok(TABLES.get_or_init(|| built))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_compile() {
        let tables = ExtractionTables::new().unwrap();
        assert_eq!(tables.values.len(), 6);
        assert_eq!(tables.values[0].kind, ValueKind::Percentage);
        assert_eq!(tables.values[5].kind, ValueKind::Number);
        assert_eq!(tables.time_patterns.len(), 3);
    }

    #[test]
    fn test_shared_is_built_once() {
        let a = ExtractionTables::shared().unwrap();
        let b = ExtractionTables::shared().unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_category_rule_order() {
        let names: Vec<&str> = CATEGORY_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "cpu",
                "memory",
                "disk",
                "network",
                "response_time",
                "throughput",
                "error_rate",
                "load",
                "database",
                "cache"
            ]
        );
    }

    #[test]
    fn test_keywords_are_lowercase() {
        for rule in CATEGORY_RULES {
            for k in rule.keywords {
                assert_eq!(*k, k.to_lowercase());
            }
        }
        for rule in TREND_RULES {
            for k in rule.keywords {
                assert_eq!(*k, k.to_lowercase());
            }
        }
    }

    #[test]
    fn test_leading_patterns() {
        let tables = ExtractionTables::new().unwrap();
        assert!(tables.leading_symbol.is_match("+5 today"));
        assert!(tables.leading_symbol.is_match("$12"));
        assert!(!tables.leading_symbol.is_match("Total load"));

        assert!(tables.leading_numeric.is_match("75%"));
        assert!(tables.leading_numeric.is_match("3.14"));
        assert!(!tables.leading_numeric.is_match("Queue"));
    }
}

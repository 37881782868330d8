//! Channel search parameters
//!
//! All criteria are ANDed by the service. The client only encodes them.

use std::collections::BTreeMap;

use url::form_urlencoded;

/// Filters for `query` and `count`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelQuery {
    /// Name glob, e.g. `SR:C01*`
    pub pattern: Option<String>,
    /// Tags every result must carry
    pub tags: Vec<String>,
    /// Required property values
    pub properties: BTreeMap<String, String>,
    /// Result cap
    pub size: Option<u32>,
    /// Pagination offset
    pub from: Option<u32>,
}

impl ChannelQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn offset(mut self, from: u32) -> Self {
        self.from = Some(from);
        self
    }

    /// Parse the space-separated search syntax: `<pattern> [tag | prop=value]...`
    ///
    /// Returns `None` for blank input.
    pub fn parse(input: &str) -> Option<Self> {
        Self::from_terms(input.split(' '))
    }

    /// Build from already-split terms: the first is the pattern, each later
    /// term is one tag or one `prop=value` filter
    ///
    /// Terms are taken whole, so a value may contain spaces. Blank terms are
    /// skipped; returns `None` when none remain.
    pub fn from_terms<I, S>(terms: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut query = Self::new();
        let mut pattern = None;

        for term in terms {
            let term = term.as_ref().trim();
            if term.is_empty() {
                continue;
            }
            if pattern.is_none() {
                pattern = Some(term.to_string());
                continue;
            }
            match term.split_once('=') {
                Some((name, value)) => {
                    query.properties.insert(name.to_string(), value.to_string());
                }
                None => query.tags.push(term.to_string()),
            }
        }

        query.pattern = Some(pattern?);
        Some(query)
    }

    /// Form-encode as the service's search parameters
    ///
    /// Multi-valued filters become repeated parameters. Empty pattern and
    /// zero size/offset are left out.
    pub fn to_query_string(&self) -> String {
        let mut q = form_urlencoded::Serializer::new(String::new());

        if let Some(pattern) = self.pattern.as_deref().filter(|p| !p.is_empty()) {
            q.append_pair("~name", pattern);
        }
        for tag in &self.tags {
            q.append_pair("~tag", tag);
        }
        for (name, value) in &self.properties {
            q.append_pair(name, value);
        }
        if let Some(size) = self.size.filter(|s| *s != 0) {
            q.append_pair("~size", &size.to_string());
        }
        if let Some(from) = self.from.filter(|f| *f != 0) {
            q.append_pair("~from", &from.to_string());
        }

        q.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_encodes_nothing() {
        assert_eq!(ChannelQuery::new().to_query_string(), "");
    }

    #[test]
    fn pattern_only() {
        let q = ChannelQuery::new().pattern("SR*");
        assert_eq!(q.to_query_string(), "%7Ename=SR*");
    }

    #[test]
    fn repeated_tags_and_bare_properties() {
        let q = ChannelQuery::new()
            .pattern("*")
            .tag("archived")
            .tag("golden")
            .property("hostName", "ioc01")
            .property("iocName", "vac 1");

        assert_eq!(
            q.to_query_string(),
            "%7Ename=*&%7Etag=archived&%7Etag=golden&hostName=ioc01&iocName=vac+1"
        );
    }

    #[test]
    fn size_and_from_appended_last() {
        let q = ChannelQuery::new().tag("T1").size(1024).offset(50);
        assert_eq!(q.to_query_string(), "%7Etag=T1&%7Esize=1024&%7Efrom=50");
    }

    #[test]
    fn falsy_values_omitted() {
        let q = ChannelQuery::new().pattern("").size(0).offset(0);
        assert_eq!(q.to_query_string(), "");
    }

    #[test]
    fn values_are_form_encoded() {
        let q = ChannelQuery::new().property("a&b", "x=y/z");
        assert_eq!(q.to_query_string(), "a%26b=x%3Dy%2Fz");
    }

    #[test]
    fn parse_search_syntax() {
        let q = ChannelQuery::parse("  SR:*  archived hostName=ioc01 ").unwrap();
        assert_eq!(q.pattern.as_deref(), Some("SR:*"));
        assert_eq!(q.tags, vec!["archived"]);
        assert_eq!(q.properties["hostName"], "ioc01");
    }

    #[test]
    fn parse_keeps_equals_in_value() {
        let q = ChannelQuery::parse("* expr=a=b").unwrap();
        assert_eq!(q.properties["expr"], "a=b");
    }

    #[test]
    fn from_terms_keeps_spaces_inside_a_term() {
        let q = ChannelQuery::from_terms(["SR:*", "iocName=vac 1", "golden"]).unwrap();
        assert_eq!(q.pattern.as_deref(), Some("SR:*"));
        assert_eq!(q.properties["iocName"], "vac 1");
        assert_eq!(q.tags, vec!["golden"]);
        assert_eq!(
            q.to_query_string(),
            "%7Ename=SR%3A*&%7Etag=golden&iocName=vac+1"
        );
    }

    #[test]
    fn from_terms_skips_blank_terms() {
        let q = ChannelQuery::from_terms(["", "  ", "ch*"]).unwrap();
        assert_eq!(q.pattern.as_deref(), Some("ch*"));
        assert!(ChannelQuery::from_terms(Vec::<String>::new()).is_none());
    }

    #[test]
    fn parse_blank_is_none() {
        assert!(ChannelQuery::parse("   ").is_none());
    }
}

use std::collections::{BTreeMap, HashMap};

/// Translates PUNTO salesperson codes into Logo salesperson codes.
#[derive(Debug, Clone, Default)]
pub struct SalespersonMap {
    by_code: HashMap<String, String>,
}

impl SalespersonMap {
    pub fn new(mapping: &BTreeMap<String, String>) -> Self {
        let by_code = mapping
            .iter()
            .map(|(from, to)| (from.trim().to_uppercase(), to.clone()))
            .collect();
        Self { by_code }
    }

    /// Logo code for `code`. Lookup ignores case and surrounding spaces;
    /// unmapped codes come back unchanged.
    pub fn resolve(&self, code: &str) -> String {
        if code.trim().is_empty() {
            return code.to_string();
        }
        self.by_code
            .get(&code.trim().to_uppercase())
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }

    /// Like [`resolve`](Self::resolve) but keeps `None` as `None`.
    pub fn resolve_opt(&self, code: Option<&str>) -> Option<String> {
        code.map(|c| self.resolve(c))
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> SalespersonMap {
        let mut m = BTreeMap::new();
        m.insert("p01".to_string(), "S.001".to_string());
        m.insert(" P02 ".to_string(), "S.002".to_string());
        SalespersonMap::new(&m)
    }

    #[test]
    fn test_resolve_is_case_and_space_insensitive() {
        let m = map();
        assert_eq!(m.resolve("P01"), "S.001");
        assert_eq!(m.resolve(" p02"), "S.002");
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_unmapped_code_passes_through() {
        let m = map();
        assert_eq!(m.resolve("X9"), "X9");
        assert_eq!(m.resolve(""), "");
        assert_eq!(m.resolve_opt(None), None);
    }
}

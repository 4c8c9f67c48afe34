use serde::Deserialize;

/// Wire shape of the catalog endpoint response.
#[derive(Debug, Deserialize)]
pub struct CatalogsResponse {
    #[serde(default)]
    pub data: Vec<CatalogType>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogType {
    pub catalog_type_code: i64,
    pub catalog_type_name: String,
    #[serde(default)]
    pub catalog_values: Vec<CatalogValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogValue {
    pub catalog_value_code: i64,
    pub catalog_value_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCodes {
    pub type_code: Option<i64>,
    pub value_code: Option<i64>,
}

/// Read-only snapshot of the two-level category taxonomy, fetched once per
/// run and shared by every record iteration.
#[derive(Debug)]
pub struct CatalogIndex {
    types: Vec<CatalogType>,
}

impl CatalogIndex {
    pub fn new(types: Vec<CatalogType>) -> Self {
        Self { types }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resolves category and subcategory names to catalog codes using
    /// case-insensitive substring containment. The first catalog entry whose
    /// name contains the needle wins; entry names are not guaranteed to be
    /// unique substrings of each other. The subcategory is only searched
    /// within the matched category. No category match leaves both codes unset.
    pub fn resolve(&self, category: &str, subcategory: &str) -> ResolvedCodes {
        let category_needle = category.trim().to_uppercase();
        let matched = self
            .types
            .iter()
            .find(|t| t.catalog_type_name.to_uppercase().contains(&category_needle));

        let Some(catalog_type) = matched else {
            return ResolvedCodes {
                type_code: None,
                value_code: None,
            };
        };

        let subcategory_needle = subcategory.trim().to_uppercase();
        let value = catalog_type
            .catalog_values
            .iter()
            .find(|v| v.catalog_value_name.to_uppercase().contains(&subcategory_needle));

        ResolvedCodes {
            type_code: Some(catalog_type.catalog_type_code),
            value_code: value.map(|v| v.catalog_value_code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security_index() -> CatalogIndex {
        CatalogIndex::new(vec![
            CatalogType {
                catalog_type_code: 1,
                catalog_type_name: "SEGURIDAD".to_string(),
                catalog_values: vec![
                    CatalogValue {
                        catalog_value_code: 10,
                        catalog_value_name: "ROBO".to_string(),
                    },
                    CatalogValue {
                        catalog_value_code: 11,
                        catalog_value_name: "ROBO AGRAVADO".to_string(),
                    },
                ],
            },
            CatalogType {
                catalog_type_code: 2,
                catalog_type_name: "SALUD".to_string(),
                catalog_values: vec![CatalogValue {
                    catalog_value_code: 20,
                    catalog_value_name: "ACCIDENTE".to_string(),
                }],
            },
        ])
    }

    #[test]
    fn resolves_by_case_insensitive_substring() {
        let codes = security_index().resolve("seguridad", "robo");
        assert_eq!(codes.type_code, Some(1));
        assert_eq!(codes.value_code, Some(10));
    }

    #[test]
    fn unknown_category_leaves_both_codes_unset() {
        let codes = security_index().resolve("desconocido", "x");
        assert_eq!(codes.type_code, None);
        assert_eq!(codes.value_code, None);
    }

    #[test]
    fn subcategory_is_only_searched_within_matched_category() {
        // ACCIDENTE exists under SALUD, not SEGURIDAD
        let codes = security_index().resolve("seguridad", "accidente");
        assert_eq!(codes.type_code, Some(1));
        assert_eq!(codes.value_code, None);
    }

    #[test]
    fn first_matching_entry_wins() {
        // "ROBO" is a substring of both values; input order decides
        let codes = security_index().resolve("SEGURIDAD", "ROBO");
        assert_eq!(codes.value_code, Some(10));
    }

    #[test]
    fn empty_index_resolves_nothing() {
        let index = CatalogIndex::new(Vec::new());
        assert!(index.is_empty());
        let codes = index.resolve("SEGURIDAD", "ROBO");
        assert_eq!(codes.type_code, None);
        assert_eq!(codes.value_code, None);
    }
}

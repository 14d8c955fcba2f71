use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub key: Option<String>,
    pub repo: Option<String>,
    pub name: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub html_desc: Option<String>,
    pub md_desc: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub internal_key: Option<String>,
    pub is_template: Option<bool>,
    pub template_key: Option<String>,
    pub tags: Option<Vec<String>>,
    pub sys_tags: Option<Vec<String>>,
    pub lang: Option<String>,
    pub lang_name: Option<String>,
    #[serde(rename = "type")]
    pub rule_type: Option<String>,
    pub scope: Option<String>,
    pub is_external: Option<bool>,
    pub rem_fn_type: Option<String>,
    pub rem_fn_base_effort: Option<String>,
    pub rem_fn_gap_multiplier: Option<String>,
    pub default_rem_fn_type: Option<String>,
    pub default_rem_fn_base_effort: Option<String>,
    pub gap_description: Option<String>,
    pub debt_overloaded: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Rule {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_fields_are_typed_and_unknown_fields_are_kept() {
        let rule: Rule = serde_json::from_value(json!({
            "key": "java:S1068",
            "repo": "java",
            "name": "Unused private fields should be removed",
            "createdAt": "2013-08-29T16:10:51+0200",
            "severity": "MAJOR",
            "sysTags": ["unused"],
            "type": "CODE_SMELL",
            "isTemplate": false,
            "params": [{"key": "max", "defaultValue": "3"}],
            "id": 1205,
            "educationPrinciples": []
        }))
        .expect("decode");

        assert_eq!(rule.key.as_deref(), Some("java:S1068"));
        assert_eq!(rule.rule_type.as_deref(), Some("CODE_SMELL"));
        assert_eq!(rule.sys_tags, Some(vec!["unused".to_string()]));
        assert_eq!(rule.is_template, Some(false));
        assert_eq!(rule.field("id"), Some(&json!(1205)));
        assert!(rule.field("params").is_some());
        assert!(rule.field("educationPrinciples").is_some());
        assert!(rule.field("key").is_none());
    }

    #[test]
    fn null_known_fields_decode_as_missing() {
        let rule: Rule = serde_json::from_value(json!({
            "key": "cpp:S100",
            "tags": null,
            "severity": null
        }))
        .expect("decode");
        assert_eq!(rule.tags, None);
        assert_eq!(rule.severity, None);
    }
}

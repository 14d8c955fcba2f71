use serde_json::Value;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::core::Rule;

pub const DEFAULT_COLUMNS: [&str; 17] = [
    "id",
    "key",
    "status",
    "name",
    "createdAt",
    "langName",
    "htmlDesc",
    "severity",
    "status",
    "sysTags",
    "type",
    "source",
    "category",
    "remFnType",
    "remFnBaseEffort",
    "repo",
    "comment",
];

const SONAR_DATE_TIME: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory][offset_minute]"
);
const PLAIN_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Date(OffsetDateTime),
}

impl CellValue {
    fn text(value: Option<&str>) -> Self {
        match value {
            Some(s) => CellValue::Text(s.to_string()),
            None => CellValue::Empty,
        }
    }

    fn list(value: Option<&Vec<String>>) -> Self {
        match value {
            Some(items) => CellValue::Text(items.join(", ")),
            None => CellValue::Empty,
        }
    }

    fn flag(value: Option<bool>) -> Self {
        match value {
            Some(b) => CellValue::Text(b.to_string()),
            None => CellValue::Empty,
        }
    }

    fn date(value: Option<&str>) -> Self {
        let Some(raw) = value else {
            return CellValue::Empty;
        };
        match parse_rule_date(raw) {
            Some(dt) => CellValue::Date(dt),
            None => CellValue::Text(raw.to_string()),
        }
    }

    fn json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Array(items) => CellValue::Text(
                items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            other => CellValue::Text(other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Date(_) => false,
        }
    }
}

pub fn parse_rule_date(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = OffsetDateTime::parse(raw, SONAR_DATE_TIME) {
        return Some(dt);
    }
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt);
    }
    Date::parse(raw, PLAIN_DATE)
        .ok()
        .map(|d| d.midnight().assume_utc())
}

type Accessor = fn(&Rule) -> CellValue;

const ACCESSORS: &[(&str, Accessor)] = &[
    ("key", |r| CellValue::text(r.key.as_deref())),
    ("repo", |r| CellValue::text(r.repo.as_deref())),
    ("name", |r| CellValue::text(r.name.as_deref())),
    ("createdAt", |r| CellValue::date(r.created_at.as_deref())),
    ("updatedAt", |r| CellValue::date(r.updated_at.as_deref())),
    ("htmlDesc", |r| CellValue::text(r.html_desc.as_deref())),
    ("mdDesc", |r| CellValue::text(r.md_desc.as_deref())),
    ("severity", |r| CellValue::text(r.severity.as_deref())),
    ("status", |r| CellValue::text(r.status.as_deref())),
    ("internalKey", |r| CellValue::text(r.internal_key.as_deref())),
    ("isTemplate", |r| CellValue::flag(r.is_template)),
    ("templateKey", |r| CellValue::text(r.template_key.as_deref())),
    ("tags", |r| CellValue::list(r.tags.as_ref())),
    ("sysTags", |r| CellValue::list(r.sys_tags.as_ref())),
    ("lang", |r| CellValue::text(r.lang.as_deref())),
    ("langName", |r| CellValue::text(r.lang_name.as_deref())),
    ("type", |r| CellValue::text(r.rule_type.as_deref())),
    ("scope", |r| CellValue::text(r.scope.as_deref())),
    ("isExternal", |r| CellValue::flag(r.is_external)),
    ("remFnType", |r| CellValue::text(r.rem_fn_type.as_deref())),
    ("remFnBaseEffort", |r| {
        CellValue::text(r.rem_fn_base_effort.as_deref())
    }),
    ("remFnGapMultiplier", |r| {
        CellValue::text(r.rem_fn_gap_multiplier.as_deref())
    }),
    ("defaultRemFnType", |r| {
        CellValue::text(r.default_rem_fn_type.as_deref())
    }),
    ("defaultRemFnBaseEffort", |r| {
        CellValue::text(r.default_rem_fn_base_effort.as_deref())
    }),
    ("gapDescription", |r| {
        CellValue::text(r.gap_description.as_deref())
    }),
    ("debtOverloaded", |r| CellValue::flag(r.debt_overloaded)),
];

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    accessor: Option<Accessor>,
}

impl Column {
    pub fn resolve(name: &str) -> Self {
        let accessor = ACCESSORS
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, accessor)| *accessor);
        Self {
            name: name.to_string(),
            accessor,
        }
    }

    pub fn value(&self, rule: &Rule) -> CellValue {
        match self.accessor {
            Some(accessor) => accessor(rule),
            None => rule
                .field(&self.name)
                .map(CellValue::json)
                .unwrap_or(CellValue::Empty),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn build(rules: &[Rule], columns: &[String]) -> Self {
        let plan: Vec<Column> = columns.iter().map(|c| Column::resolve(c)).collect();
        let rows = rules
            .iter()
            .map(|rule| plan.iter().map(|col| col.value(rule)).collect())
            .collect();
        Self {
            header: columns.to_vec(),
            rows,
        }
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn rule(v: serde_json::Value) -> Rule {
        serde_json::from_value(v).expect("decode rule")
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn header_is_verbatim_and_rows_follow_column_order() {
        let rules = vec![
            rule(json!({"key": "java:S100", "name": "Method names", "severity": "MINOR"})),
            rule(json!({"key": "java:S101", "name": "Class names", "severity": "MAJOR"})),
            rule(json!({"key": "java:S102"})),
        ];
        let cols = columns(&["severity", "key", "name"]);
        let table = Table::build(&rules, &cols);

        assert_eq!(table.header, cols);
        assert_eq!(table.rows.len(), 3);
        assert!(table.rows.iter().all(|row| row.len() == 3));
        assert_eq!(
            table.rows[1],
            vec![
                CellValue::Text("MAJOR".to_string()),
                CellValue::Text("java:S101".to_string()),
                CellValue::Text("Class names".to_string()),
            ]
        );
        assert_eq!(table.rows[2][0], CellValue::Empty);
    }

    #[test]
    fn unknown_column_is_entirely_empty() {
        let rules = vec![
            rule(json!({"key": "java:S100"})),
            rule(json!({"key": "java:S101"})),
        ];
        let table = Table::build(&rules, &columns(&["key", "noSuchField"]));
        assert!(table.rows.iter().all(|row| row[1] == CellValue::Empty));
    }

    #[test]
    fn duplicate_columns_are_kept() {
        let rules = vec![rule(json!({"status": "READY"}))];
        let table = Table::build(&rules, &columns(&["status", "status"]));
        assert_eq!(table.header, columns(&["status", "status"]));
        assert_eq!(table.rows[0][0], table.rows[0][1]);
    }

    #[test]
    fn default_columns_keep_seventeen_entries() {
        assert_eq!(DEFAULT_COLUMNS.len(), 17);
        let rules = vec![rule(json!({"key": "java:S100", "sysTags": ["a", "b"]}))];
        let cols: Vec<String> = DEFAULT_COLUMNS.iter().map(|s| s.to_string()).collect();
        let table = Table::build(&rules, &cols);
        assert_eq!(table.width(), 17);
        assert_eq!(table.rows[0][9], CellValue::Text("a, b".to_string()));
    }

    #[test]
    fn created_at_becomes_a_date_cell() {
        let rules = vec![
            rule(json!({"createdAt": "2013-08-29T16:10:51+0200"})),
            rule(json!({"createdAt": "not a date"})),
        ];
        let table = Table::build(&rules, &columns(&["createdAt"]));
        assert_eq!(
            table.rows[0][0],
            CellValue::Date(datetime!(2013-08-29 16:10:51 +02:00))
        );
        assert_eq!(table.rows[1][0], CellValue::Text("not a date".to_string()));
    }

    #[test]
    fn rule_dates_accept_rfc3339_and_plain_dates() {
        assert_eq!(
            parse_rule_date("2020-01-02T03:04:05Z"),
            Some(datetime!(2020-01-02 03:04:05 UTC))
        );
        assert_eq!(
            parse_rule_date("2020-01-02"),
            Some(datetime!(2020-01-02 00:00:00 UTC))
        );
        assert_eq!(parse_rule_date("yesterday"), None);
    }

    #[test]
    fn unknown_columns_fall_back_to_extra_fields() {
        let rules = vec![rule(json!({
            "id": 1205,
            "comment": "legacy",
            "params": [{"key": "max"}],
            "educationPrinciples": ["defense_in_depth", null],
            "isTemplate": true
        }))];
        let table = Table::build(
            &rules,
            &columns(&["id", "comment", "params", "educationPrinciples", "isTemplate"]),
        );
        assert_eq!(
            table.rows[0],
            vec![
                CellValue::Text("1205".to_string()),
                CellValue::Text("legacy".to_string()),
                CellValue::Text(r#"{"key":"max"}"#.to_string()),
                CellValue::Text("defense_in_depth".to_string()),
                CellValue::Text("true".to_string()),
            ]
        );
    }
}

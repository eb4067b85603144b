//! Prepared queries

use crate::config::ScrollMode;
use crate::error::Result;
use crate::params::{ParameterBag, ParameterBindable};
use crate::query;

/// A query whose sheet has been extracted, plus its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    sql: String,
    sheet: String,
    scroll: ScrollMode,
    parameters: ParameterBag,
}

impl PreparedQuery {
    /// Extract the sheet name of `sql`; fails with `MalformedQuery` without a `FROM`
    pub fn new(sql: impl Into<String>, scroll: ScrollMode) -> Result<Self> {
        let sql = sql.into();
        let sheet = query::sheet_name(&sql)?;
        Ok(Self {
            sql,
            sheet,
            scroll,
            parameters: ParameterBag::new(),
        })
    }

    /// Builder-style scroll mode
    pub fn with_scroll(mut self, scroll: ScrollMode) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Sheet the query selects from
    pub fn sheet_name(&self) -> &str {
        &self.sheet
    }

    pub fn scroll(&self) -> ScrollMode {
        self.scroll
    }

    pub fn parameters(&self) -> &ParameterBag {
        &self.parameters
    }
}

impl ParameterBindable for PreparedQuery {
    fn parameters_mut(&mut self) -> &mut ParameterBag {
        &mut self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqlError;
    use crate::params::ParameterValue;

    #[test]
    fn test_prepare_extracts_sheet() {
        let query =
            PreparedQuery::new("SELECT * FROM [Q1 Sales]", ScrollMode::ForwardOnly).unwrap();
        assert_eq!(query.sheet_name(), "Q1 Sales");
        assert_eq!(query.sql(), "SELECT * FROM [Q1 Sales]");
        assert_eq!(query.scroll(), ScrollMode::ForwardOnly);
        assert_eq!(
            query.with_scroll(ScrollMode::Scrollable).scroll(),
            ScrollMode::Scrollable
        );
    }

    #[test]
    fn test_prepare_without_from() {
        assert!(matches!(
            PreparedQuery::new("SELECT 1", ScrollMode::ForwardOnly),
            Err(SqlError::MalformedQuery(_))
        ));
    }

    #[test]
    fn test_parameters_survive_until_cleared() {
        let mut query = PreparedQuery::new("SELECT * FROM Sheet1", ScrollMode::Scrollable).unwrap();
        query.set_parameter(2, "x").unwrap();
        query.set_null(1).unwrap();
        assert_eq!(query.parameters().len(), 2);
        assert_eq!(query.parameters().get(2), Some(&ParameterValue::Text("x".to_string())));
        query.clear_parameters();
        assert!(query.parameters().is_empty());
    }
}

use super::error::FilterError;
use super::types::{Condition, FilterOrderInfo, SortDirection, SqlParam, SqlResult};

/// Builds parameterised single-table statements from equality conditions.
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: String,
    conditions: Vec<Condition>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    lock_rows: bool,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(table_name));
        }
        Ok(Self {
            table_name,
            conditions: vec![],
            order_data: vec![],
            limit: None,
            lock_rows: false,
        })
    }

    pub fn where_eq(mut self, column: &str, value: impl Into<SqlParam>) -> Result<Self, FilterError> {
        validate_column(column)?;
        self.conditions.push(Condition::Eq(column.to_string(), value.into()));
        Ok(self)
    }

    pub fn where_in(mut self, column: &str, values: impl Into<SqlParam>) -> Result<Self, FilterError> {
        validate_column(column)?;
        self.conditions.push(Condition::In(column.to_string(), values.into()));
        Ok(self)
    }

    pub fn order(mut self, column: &str, sort: SortDirection) -> Result<Self, FilterError> {
        validate_column(column)?;
        self.order_data.push(FilterOrderInfo { column: column.to_string(), sort });
        Ok(self)
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit.max(0));
        self
    }

    /// Appends `FOR UPDATE` to the SELECT, holding the matched rows until the
    /// surrounding transaction ends.
    pub fn for_update(mut self) -> Self {
        self.lock_rows = true;
        self
    }

    pub fn is_scoped(&self) -> bool {
        !self.conditions.is_empty()
    }

    pub fn to_select_sql(&self) -> SqlResult {
        let (where_clause, params) = self.build_where(1);
        let query = [
            format!("SELECT * FROM \"{}\"", self.table_name),
            where_clause,
            self.build_order_clause(),
            self.build_limit_clause(),
            if self.lock_rows { "FOR UPDATE".to_string() } else { String::new() },
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let (where_clause, params) = self.build_where(1);
        let query = if where_clause.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table_name)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" {}", self.table_name, where_clause)
        };
        SqlResult { query, params }
    }

    pub fn to_delete_sql(&self) -> Result<SqlResult, FilterError> {
        if !self.is_scoped() {
            return Err(FilterError::Unscoped("DELETE"));
        }
        let (where_clause, params) = self.build_where(1);
        Ok(SqlResult {
            query: format!("DELETE FROM \"{}\" {}", self.table_name, where_clause),
            params,
        })
    }

    /// `UPDATE ... SET ... WHERE ... RETURNING *`. Assignment params come first.
    pub fn to_update_sql(&self, assignments: Vec<(&str, SqlParam)>) -> Result<SqlResult, FilterError> {
        if !self.is_scoped() {
            return Err(FilterError::Unscoped("UPDATE"));
        }
        if assignments.is_empty() {
            return Err(FilterError::EmptyAssignment);
        }

        let mut params = Vec::with_capacity(assignments.len() + self.conditions.len());
        let mut set_parts = Vec::with_capacity(assignments.len());
        for (column, value) in assignments {
            validate_column(column)?;
            params.push(value);
            set_parts.push(format!("\"{}\" = ${}", column, params.len()));
        }

        let (where_clause, where_params) = self.build_where(params.len() + 1);
        params.extend(where_params);

        Ok(SqlResult {
            query: format!(
                "UPDATE \"{}\" SET {} {} RETURNING *",
                self.table_name,
                set_parts.join(", "),
                where_clause
            ),
            params,
        })
    }

    fn build_where(&self, first_index: usize) -> (String, Vec<SqlParam>) {
        if self.conditions.is_empty() {
            return (String::new(), vec![]);
        }

        let mut params = Vec::with_capacity(self.conditions.len());
        let mut parts = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            let index = first_index + params.len();
            match condition {
                Condition::Eq(column, value) => {
                    parts.push(format!("\"{}\" = ${}", column, index));
                    params.push(value.clone());
                }
                Condition::In(column, values) => {
                    parts.push(format!("\"{}\" = ANY(${})", column, index));
                    params.push(values.clone());
                }
            }
        }
        (format!("WHERE {}", parts.join(" AND ")), params)
    }

    fn build_order_clause(&self) -> String {
        if self.order_data.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .order_data
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    fn build_limit_clause(&self) -> String {
        match self.limit {
            Some(l) => format!("LIMIT {}", l),
            None => String::new(),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn validate_column(column: &str) -> Result<(), FilterError> {
    if is_identifier(column) {
        Ok(())
    } else {
        Err(FilterError::InvalidColumn(column.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn rejects_bad_identifiers() {
        assert!(matches!(Filter::new("clients; DROP TABLE x"), Err(FilterError::InvalidTableName(_))));
        assert!(matches!(Filter::new("1clients"), Err(FilterError::InvalidTableName(_))));
        let filter = Filter::new("clients").unwrap();
        assert!(matches!(filter.where_eq("user id", "x"), Err(FilterError::InvalidColumn(_))));
    }

    #[test]
    fn single_row_lock() {
        let id = Uuid::new_v4();
        let sql = Filter::new("tasks")
            .unwrap()
            .where_eq("id", id)
            .unwrap()
            .limit(1)
            .for_update()
            .to_select_sql();

        assert_eq!(sql.query, "SELECT * FROM \"tasks\" WHERE \"id\" = $1 LIMIT 1 FOR UPDATE");
        assert_eq!(sql.params, vec![SqlParam::Uuid(id)]);
    }

    #[test]
    fn select_with_scope_order_and_limit() {
        let user = Uuid::new_v4();
        let sql = Filter::new("projects")
            .unwrap()
            .where_eq("user_id", user)
            .unwrap()
            .order("created_at", SortDirection::Desc)
            .unwrap()
            .limit(10)
            .to_select_sql();

        assert_eq!(
            sql.query,
            "SELECT * FROM \"projects\" WHERE \"user_id\" = $1 ORDER BY \"created_at\" DESC LIMIT 10"
        );
        assert_eq!(sql.params, vec![SqlParam::Uuid(user)]);
    }

    #[test]
    fn in_condition_uses_any() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let sql = Filter::new("clients")
            .unwrap()
            .where_eq("user_id", Uuid::nil())
            .unwrap()
            .where_in("id", ids.clone())
            .unwrap()
            .to_select_sql();

        assert_eq!(sql.query, "SELECT * FROM \"clients\" WHERE \"user_id\" = $1 AND \"id\" = ANY($2)");
        assert_eq!(sql.params[1], SqlParam::UuidList(ids));
    }

    #[test]
    fn count_without_conditions() {
        let sql = Filter::new("clients").unwrap().to_count_sql();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"clients\"");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn update_numbers_assignments_before_conditions() {
        let id = Uuid::new_v4();
        let user = Uuid::new_v4();
        let sql = Filter::new("tasks")
            .unwrap()
            .where_eq("id", id)
            .unwrap()
            .where_eq("user_id", user)
            .unwrap()
            .to_update_sql(vec![("status", "done".into()), ("completed_at", SqlParam::OptTimestamp(None))])
            .unwrap();

        assert_eq!(
            sql.query,
            "UPDATE \"tasks\" SET \"status\" = $1, \"completed_at\" = $2 WHERE \"id\" = $3 AND \"user_id\" = $4 RETURNING *"
        );
        assert_eq!(sql.params.len(), 4);
        assert_eq!(sql.params[2], SqlParam::Uuid(id));
    }

    #[test]
    fn unscoped_writes_are_refused() {
        let filter = Filter::new("tasks").unwrap();
        assert_eq!(filter.to_delete_sql().unwrap_err(), FilterError::Unscoped("DELETE"));
        assert_eq!(
            filter.to_update_sql(vec![("status", "todo".into())]).unwrap_err(),
            FilterError::Unscoped("UPDATE")
        );
    }

    #[test]
    fn delete_is_scoped() {
        let sql = Filter::new("tasks")
            .unwrap()
            .where_eq("id", Uuid::nil())
            .unwrap()
            .to_delete_sql()
            .unwrap();
        assert_eq!(sql.query, "DELETE FROM \"tasks\" WHERE \"id\" = $1");
    }
}

//! Filtered-list query builder
//!
//! Every list endpoint shares this component instead of hand-assembling its
//! own SQL. A builder collects optional filter clauses, then emits a count
//! query and a paginated data query whose texts and positional parameter
//! indices stay in lock-step. Substring terms are escaped before pattern
//! wrapping, sort columns come from per-entity allow-lists, and page/limit
//! parse leniently with clamping instead of failing.

use crate::models::Pagination;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio_postgres::types::ToSql;

/// Owned query parameter, boxed so mixed filter types share one vector
pub type SqlParam = Box<dyn ToSql + Sync + Send>;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw pagination query parameters, parsed leniently
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    /// Clamp to defaults on anything non-numeric or non-positive.
    pub fn resolve(&self) -> Page {
        Page {
            page: parse_positive(self.page.as_deref()).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(self.limit.as_deref())
                .map(|l| l.min(MAX_LIMIT))
                .unwrap_or(DEFAULT_LIMIT),
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
}

/// Lenient integer parse for non-paging numeric filters; garbage means
/// "filter absent", matching how the portal always treated query strings.
pub fn parse_i32(raw: Option<&str>) -> Option<i32> {
    raw.and_then(|s| s.trim().parse::<i32>().ok())
}

/// Resolved page/limit pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Pagination metadata: `totalPages = ceil(total / limit)`.
    pub fn meta(&self, total: i64) -> Pagination {
        Pagination {
            total,
            page: self.page,
            limit: self.limit,
            total_pages: (total + self.limit - 1) / self.limit,
        }
    }

    /// In-memory page slice, for lists that must filter on derived fields
    /// before paginating.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .collect()
    }
}

/// Escape LIKE/ILIKE metacharacters so user terms match literally.
pub fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Requested sort direction; anything but `asc` means descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Resolve a client-requested sort field against an allow-list of
/// `(request name, SQL column)` pairs. Unknown names fall back to the
/// default column; client strings never reach the query text.
pub fn sort_column<'a>(
    requested: Option<&str>,
    allowed: &[(&str, &'a str)],
    default: &'a str,
) -> &'a str {
    requested
        .and_then(|name| allowed.iter().find(|(n, _)| *n == name))
        .map(|(_, col)| *col)
        .unwrap_or(default)
}

/// Builder for a filtered, paginated list query pair
pub struct ListQuery {
    data_base: String,
    count_base: String,
    conditions: Vec<String>,
    params: Vec<SqlParam>,
}

impl ListQuery {
    /// `data_base` selects the rows, `count_base` counts them; both end just
    /// before the WHERE clause and must reference the same tables/aliases.
    pub fn new(data_base: impl Into<String>, count_base: impl Into<String>) -> Self {
        Self {
            data_base: data_base.into(),
            count_base: count_base.into(),
            conditions: Vec::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, value: SqlParam) -> usize {
        self.params.push(value);
        self.params.len()
    }

    /// Unconditional clause with no parameters (e.g. soft-delete guards)
    pub fn filter_raw(&mut self, condition: &str) {
        self.conditions.push(condition.to_string());
    }

    /// Equality filter, applied only when a value is present
    pub fn eq<T>(&mut self, column: &str, value: Option<T>)
    where
        T: ToSql + Sync + Send + 'static,
    {
        if let Some(value) = value {
            let idx = self.push_param(Box::new(value));
            self.conditions.push(format!("{} = ${}", column, idx));
        }
    }

    /// Equality filter for text parameters; empty strings count as absent
    pub fn eq_text(&mut self, column: &str, value: Option<&str>) {
        self.eq(column, non_empty(value).map(str::to_string));
    }

    /// Case-insensitive substring filter with escaped `%term%` wrapping
    pub fn contains(&mut self, column: &str, term: Option<&str>) {
        if let Some(term) = non_empty(term) {
            let idx = self.push_param(Box::new(format!("%{}%", escape_like(term))));
            self.conditions.push(format!("{} ILIKE ${}", column, idx));
        }
    }

    /// Substring filter across several columns sharing a single parameter
    pub fn contains_any(&mut self, columns: &[&str], term: Option<&str>) {
        if let Some(term) = non_empty(term) {
            let idx = self.push_param(Box::new(format!("%{}%", escape_like(term))));
            let group = columns
                .iter()
                .map(|col| format!("{} ILIKE ${}", col, idx))
                .collect::<Vec<_>>()
                .join(" OR ");
            self.conditions.push(format!("({})", group));
        }
    }

    /// Restrict a date column to one calendar year
    pub fn in_year(&mut self, column: &str, year: Option<i32>) {
        if let Some(year) = year {
            let (Some(first), Some(last)) = (
                NaiveDate::from_ymd_opt(year, 1, 1),
                NaiveDate::from_ymd_opt(year, 12, 31),
            ) else {
                return;
            };
            let lo = self.push_param(Box::new(first));
            let hi = self.push_param(Box::new(last));
            self.conditions
                .push(format!("{col} >= ${lo} AND {col} <= ${hi}", col = column));
        }
    }

    /// Array-membership filter (`$n = ANY(column)`)
    pub fn has_element(&mut self, column: &str, value: Option<&str>) {
        if let Some(value) = non_empty(value) {
            let idx = self.push_param(Box::new(value.to_string()));
            self.conditions.push(format!("${} = ANY({})", idx, column));
        }
    }

    /// `column IS NOT NULL`, applied when the flag is set
    pub fn not_null(&mut self, column: &str, apply: bool) {
        if apply {
            self.conditions.push(format!("{} IS NOT NULL", column));
        }
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Finalize into a count/data query pair.
    ///
    /// `tail` carries everything after the WHERE clause of the data query
    /// (GROUP BY / ORDER BY). With a page, LIMIT/OFFSET land in the last two
    /// parameter slots of the data query only.
    pub fn build(self, tail: &str, page: Option<Page>) -> BuiltQuery {
        let where_clause = self.where_clause();
        let count_sql = format!("{}{}", self.count_base, where_clause);
        let mut data_sql = format!("{}{} {}", self.data_base, where_clause, tail);

        if page.is_some() {
            let next = self.params.len() + 1;
            data_sql.push_str(&format!(" LIMIT ${} OFFSET ${}", next, next + 1));
        }

        BuiltQuery {
            count_sql,
            data_sql,
            params: self.params,
            page: page.map(|p| (p.limit, p.offset())),
        }
    }
}

/// Finalized query pair plus its parameter sets
pub struct BuiltQuery {
    pub count_sql: String,
    pub data_sql: String,
    params: Vec<SqlParam>,
    page: Option<(i64, i64)>,
}

impl BuiltQuery {
    /// Parameters for the count query (filters only)
    pub fn count_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| {
                let param: &(dyn ToSql + Sync) = p.as_ref();
                param
            })
            .collect()
    }

    /// Parameters for the data query (filters, then limit and offset)
    pub fn data_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let mut params = self.count_params();
        if let Some((limit, offset)) = &self.page {
            params.push(limit);
            params.push(offset);
        }
        params
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(page: i64, limit: i64) -> Page {
        Page { page, limit }
    }

    #[test]
    fn test_count_and_data_queries_stay_in_lock_step() {
        let mut q = ListQuery::new(
            "SELECT * FROM publications p",
            "SELECT COUNT(*) FROM publications p",
        );
        q.eq_text("p.department", Some("Computer Science"));
        q.contains("p.title", Some("deep learning"));
        q.eq("p.year", Some(2024));

        let built = q.build("ORDER BY p.year DESC", Some(page(1, 10)));

        let expected_where = " WHERE p.department = $1 AND p.title ILIKE $2 AND p.year = $3";
        assert_eq!(
            built.count_sql,
            format!("SELECT COUNT(*) FROM publications p{}", expected_where)
        );
        assert_eq!(
            built.data_sql,
            format!(
                "SELECT * FROM publications p{} ORDER BY p.year DESC LIMIT $4 OFFSET $5",
                expected_where
            )
        );
        assert_eq!(built.count_params().len(), 3);
        assert_eq!(built.data_params().len(), 5);
    }

    #[test]
    fn test_no_filters_emits_no_where_clause() {
        let q = ListQuery::new("SELECT * FROM awards", "SELECT COUNT(*) FROM awards");
        let built = q.build("ORDER BY created_at DESC", Some(page(1, 10)));
        assert_eq!(built.count_sql, "SELECT COUNT(*) FROM awards");
        assert_eq!(
            built.data_sql,
            "SELECT * FROM awards ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_unpaged_build_has_no_limit() {
        let mut q = ListQuery::new("SELECT * FROM t", "SELECT COUNT(*) FROM t");
        q.eq("t.year", Some(2024));
        let built = q.build("ORDER BY t.id DESC", None);
        assert!(!built.data_sql.contains("LIMIT"));
        assert_eq!(built.data_params().len(), 1);
    }

    #[test]
    fn test_empty_text_filters_are_skipped() {
        let mut q = ListQuery::new("SELECT * FROM t", "SELECT COUNT(*) FROM t");
        q.eq_text("t.department", Some(""));
        q.contains("t.title", Some("   "));
        let built = q.build("ORDER BY t.id", None);
        assert_eq!(built.count_sql, "SELECT COUNT(*) FROM t");
    }

    #[test]
    fn test_contains_any_shares_one_parameter() {
        let mut q = ListQuery::new("SELECT * FROM t", "SELECT COUNT(*) FROM t");
        q.contains_any(&["t.title", "t.pi"], Some("kumar"));
        let built = q.build("ORDER BY t.id", None);
        assert_eq!(
            built.count_sql,
            "SELECT COUNT(*) FROM t WHERE (t.title ILIKE $1 OR t.pi ILIKE $1)"
        );
        assert_eq!(built.count_params().len(), 1);
    }

    #[test]
    fn test_in_year_binds_both_bounds() {
        let mut q = ListQuery::new("SELECT * FROM t", "SELECT COUNT(*) FROM t");
        q.in_year("t.start_date", Some(2024));
        let built = q.build("ORDER BY t.id", None);
        assert_eq!(
            built.count_sql,
            "SELECT COUNT(*) FROM t WHERE t.start_date >= $1 AND t.start_date <= $2"
        );
        assert_eq!(built.count_params().len(), 2);
    }

    #[test]
    fn test_escape_like_neutralizes_metacharacters() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_page_query_clamps_garbage() {
        let q = PageQuery {
            page: Some("abc".to_string()),
            limit: Some("-5".to_string()),
        };
        assert_eq!(q.resolve(), page(DEFAULT_PAGE, DEFAULT_LIMIT));

        let q = PageQuery {
            page: Some("0".to_string()),
            limit: Some("1000".to_string()),
        };
        assert_eq!(q.resolve(), page(DEFAULT_PAGE, MAX_LIMIT));

        assert_eq!(PageQuery::default().resolve(), page(1, 10));
    }

    #[test]
    fn test_pagination_meta_ceils_total_pages() {
        assert_eq!(page(2, 2).meta(5).total_pages, 3);
        assert_eq!(page(1, 10).meta(10).total_pages, 1);
        assert_eq!(page(1, 10).meta(11).total_pages, 2);
        assert_eq!(page(1, 10).meta(0).total_pages, 0);
    }

    #[test]
    fn test_slice_returns_requested_window() {
        let rows = vec![1, 2, 3, 4, 5];
        assert_eq!(page(2, 2).slice(rows.clone()), vec![3, 4]);
        assert_eq!(page(3, 2).slice(rows.clone()), vec![5]);
        assert_eq!(page(4, 2).slice(rows), Vec::<i32>::new());
    }

    #[test]
    fn test_sort_column_rejects_unlisted_fields() {
        let allowed = [("title", "p.title"), ("start_date", "p.start_date")];
        assert_eq!(sort_column(Some("title"), &allowed, "p.created_at"), "p.title");
        assert_eq!(
            sort_column(Some("1; DROP TABLE users"), &allowed, "p.created_at"),
            "p.created_at"
        );
        assert_eq!(sort_column(None, &allowed, "p.created_at"), "p.created_at");
    }

    #[test]
    fn test_sort_order_defaults_to_desc() {
        assert_eq!(SortOrder::parse(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(None), SortOrder::Desc);
    }
}

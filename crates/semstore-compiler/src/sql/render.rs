use super::builder::{OBJECT_IDS, ROOT_COLUMN};
use super::condition::{SqlCondition, SqlKind};
use crate::Compiled;
use std::fmt::Write as _;

/// Render a complete `SELECT` over the object id table for a compiled
/// condition. Order columns are selected alongside the id so `DISTINCT`
/// stays compatible with `ORDER BY`.
pub fn render_select(compiled: &Compiled<SqlCondition>, limit: Option<usize>, offset: usize) -> String {
    let condition = &compiled.condition;
    let mut from = vec![format!("{OBJECT_IDS} AS t0")];
    let mut predicates: Vec<String> = Vec::new();
    match &condition.kind {
        SqlKind::True => {}
        SqlKind::False => predicates.push("1 = 0".to_string()),
        SqlKind::Where { joins, predicates: p } => {
            from.extend(joins.iter().cloned());
            predicates.extend(p.iter().cloned());
        }
        SqlKind::Filter { expr } => predicates.push(expr.clone()),
        SqlKind::Singleton {
            value,
            joins,
            predicates: p,
        } => {
            from.extend(joins.iter().cloned());
            predicates.extend(p.iter().cloned());
            predicates.push(format!("{ROOT_COLUMN} = {value}"));
        }
    }

    let mut columns = vec![ROOT_COLUMN.to_string()];
    for order in &compiled.order_by {
        if !columns.contains(&order.variable) {
            columns.push(order.variable.clone());
        }
    }

    let mut query = format!("SELECT DISTINCT {}\nFROM {}", columns.join(", "), from.join("\nCROSS JOIN "));
    let mut weak: Vec<(&String, &String)> = condition.weak_joins.iter().collect();
    weak.sort_by_key(|(alias, _)| alias_number(alias));
    for (_, clause) in weak {
        let _ = write!(query, "\n{clause}");
    }
    if !predicates.is_empty() {
        let _ = write!(query, "\nWHERE {}", predicates.join("\n  AND "));
    }
    if !compiled.order_by.is_empty() {
        let order: Vec<String> = compiled
            .order_by
            .iter()
            .map(|o| format!("{} {}", o.variable, o.direction.as_str()))
            .collect();
        let _ = write!(query, "\nORDER BY {}", order.join(", "));
    }
    if let Some(limit) = limit {
        let _ = write!(query, "\nLIMIT {limit}");
    }
    if offset > 0 {
        let _ = write!(query, "\nOFFSET {offset}");
    }
    query
}

/// Left joins may reference aliases introduced by earlier ones, so they are
/// emitted in allocation order.
fn alias_number(alias: &str) -> usize {
    alias
        .strip_prefix('t')
        .and_then(|n| n.parse().ok())
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, Sql};
    use semstore_query::{Description, EntityRef, MemoryStore, QueryConfig, SortDirection};

    #[test]
    fn class_query_renders_one_join() {
        let mut store = MemoryStore::new();
        let city = store.register(EntityRef::category("City"));
        let compiled = compile::<Sql>(&Description::class(EntityRef::category("City")), &store, &QueryConfig::default());
        assert_eq!(
            render_select(&compiled, Some(50), 0),
            format!(
                "SELECT DISTINCT t0.smw_id\n\
                 FROM smw_object_ids AS t0\n\
                 CROSS JOIN smw_fpt_inst AS t1\n\
                 WHERE t1.s_id = t0.smw_id\n  AND t1.o_id = {city}\n\
                 LIMIT 50"
            )
        );
    }

    #[test]
    fn unsatisfiable_query_selects_nothing() {
        let compiled = compile::<Sql>(
            &Description::class(EntityRef::category("Unknown")),
            &MemoryStore::new(),
            &QueryConfig::default(),
        );
        assert!(render_select(&compiled, None, 0).ends_with("WHERE 1 = 0"));
    }

    #[test]
    fn sort_by_result_orders_on_sort_key() {
        let mut store = MemoryStore::new();
        store.add_sort_key("", SortDirection::Asc);
        let compiled = compile::<Sql>(&Description::thing(), &store, &QueryConfig::default());
        assert_eq!(
            render_select(&compiled, None, 10),
            "SELECT DISTINCT t0.smw_id, t1.smw_sortkey\n\
             FROM smw_object_ids AS t0\n\
             LEFT JOIN smw_object_ids AS t1 ON t1.smw_id = t0.smw_id\n\
             ORDER BY t1.smw_sortkey ASC\n\
             OFFSET 10"
        );
    }

    #[test]
    fn left_joins_follow_allocation_order() {
        assert!(alias_number("t2") < alias_number("t10"));
    }
}

use super::builder::{property_table, value_column, SqlConditionBuilder, INSTANCE_TABLE, OBJECT_IDS};
use super::condition::{like_pattern, quote, SqlCondition, SqlKind, SqlValue};
use semstore_query::{
    ClassDescription, Comparator, DataItem, Description, PropertyRef, SomeProperty, ValueDescription,
    ValueKind,
};

impl SqlConditionBuilder<'_> {
    /// Class membership as one instance-table join with an id list. Classes
    /// are expanded to their subclasses here, since the store has no
    /// transitive closure.
    pub(super) fn class_condition(
        &mut self,
        class: &ClassDescription,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SqlCondition {
        let ids = self.class_ids(class);
        if ids.is_empty() {
            return if class.is_negated() {
                self.new_true_condition(join_variable, order_by)
            } else {
                SqlCondition::new_false()
            };
        }
        let alias = self.next_alias();
        let membership = match ids.as_slice() {
            [single] => format!("{alias}.o_id = {single}"),
            _ => {
                let list: Vec<String> = ids.iter().map(u64::to_string).collect();
                format!("{alias}.o_id IN ({})", list.join(", "))
            }
        };
        let link = format!("{alias}.s_id = {join_variable}");
        let mut condition = if class.is_negated() {
            SqlCondition::new_filter(format!(
                "NOT EXISTS (SELECT 1 FROM {INSTANCE_TABLE} AS {alias} WHERE {link} AND {membership})"
            ))
        } else {
            SqlCondition::new_where(vec![format!("{INSTANCE_TABLE} AS {alias}")], vec![link, membership])
        };
        condition.join_tables.insert(INSTANCE_TABLE.to_string());
        self.add_order_by_data_for_property(&mut condition, join_variable, order_by, Some(ValueKind::Page));
        condition
    }

    fn class_ids(&self, class: &ClassDescription) -> Vec<u64> {
        let depth = match class.hierarchy_depth() {
            Some(depth) => self.config.clamp_hierarchy_depth(depth),
            None => self.config.subcategory_depth_ceiling,
        };
        let mut ids = Vec::new();
        for entity in class.classes() {
            let below = if depth > 0 {
                self.store.subclasses(entity, depth)
            } else {
                Vec::new()
            };
            for member in std::iter::once(entity).chain(below.iter()) {
                if let Some(id) = self.store.backend_identifier(member) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        ids
    }

    /// Existential property restriction: one join on the property's value
    /// table, with the inner condition constraining the value column.
    pub(super) fn property_condition(
        &mut self,
        restriction: &SomeProperty,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SqlCondition {
        let property = restriction.property();
        let Some(property_id) = self.store.backend_identifier(&property.entity()) else {
            return SqlCondition::new_false();
        };
        let kind = self.store.property_kind(&property.non_inverse());
        if property.is_inverse() && kind != ValueKind::Page {
            return SqlCondition::new_false();
        }
        let table = property_table(kind);
        let alias = self.next_alias();
        let (subject, object) = if property.is_inverse() {
            ("o_id", "s_id")
        } else {
            ("s_id", value_column(kind))
        };
        let mut predicates = vec![
            format!("{alias}.{subject} = {join_variable}"),
            format!("{alias}.p_id = {property_id}"),
        ];

        if matches!(restriction.description(), Description::Thing(t) if t.negated) {
            let mut condition = SqlCondition::new_filter(format!(
                "NOT EXISTS (SELECT 1 FROM {table} AS {alias} WHERE {})",
                predicates.join(" AND ")
            ));
            condition.join_tables.insert(table.to_string());
            return condition;
        }

        let inner_order_by = self
            .sort_key_pending(&property.key)
            .then(|| property.clone());
        let inner_variable = format!("{alias}.{object}");
        let inner = self.build_condition(restriction.description(), &inner_variable, inner_order_by.as_ref());

        let mut joins = vec![format!("{table} AS {alias}")];
        match &inner.kind {
            SqlKind::False => return SqlCondition::new_false(),
            SqlKind::True => {}
            SqlKind::Where {
                joins: j,
                predicates: p,
            } => {
                joins.extend(j.iter().cloned());
                predicates.extend(p.iter().cloned());
            }
            SqlKind::Filter { expr } => predicates.push(expr.clone()),
            SqlKind::Singleton {
                value,
                joins: j,
                predicates: p,
            } => {
                predicates.push(format!("{inner_variable} = {value}"));
                joins.extend(j.iter().cloned());
                predicates.extend(p.iter().cloned());
            }
        }

        let mut condition = SqlCondition::new_where(joins, predicates);
        condition.absorb_dependencies(&inner);
        condition.join_tables.insert(table.to_string());
        condition.order_columns = inner.order_columns.clone();
        if inner_order_by.is_some() {
            if let Some(column) = &inner.order_by_column {
                condition
                    .order_columns
                    .insert(property.key.clone(), column.clone());
                self.bound_sort_keys.insert(property.key.clone());
            }
        }
        self.add_order_by_data_for_property(&mut condition, join_variable, order_by, Some(ValueKind::Page));
        condition
    }

    pub(super) fn value_condition(
        &mut self,
        value: &ValueDescription,
        description: &Description,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SqlCondition {
        let kind = value.value.kind();
        let mut condition = match value.comparator {
            Comparator::Eq => match self.sql_value(&value.value) {
                Some(v) => SqlCondition::new_singleton(v),
                None => return SqlCondition::new_false(),
            },
            Comparator::Lt => self.comparison_condition(&value.value, "<", join_variable),
            Comparator::Gt => self.comparison_condition(&value.value, ">", join_variable),
            Comparator::Leq => self.comparison_condition(&value.value, "<=", join_variable),
            Comparator::Geq => self.comparison_condition(&value.value, ">=", join_variable),
            Comparator::Neq => self.comparison_condition(&value.value, "<>", join_variable),
            Comparator::Like | Comparator::NotLike => {
                let operator = if value.comparator == Comparator::Like {
                    "LIKE"
                } else {
                    "NOT LIKE"
                };
                let text = match &value.value {
                    DataItem::Blob(text) | DataItem::Uri(text) => text.clone(),
                    DataItem::Page(page) => page.text(),
                    DataItem::Number(_) | DataItem::Boolean(_) => {
                        let message = format!(
                            "unsupported comparison for {} values: {}",
                            kind_name(kind),
                            description.query_string(false)
                        );
                        tracing::warn!("{message}");
                        self.errors.push(message);
                        return self.new_true_condition(join_variable, order_by);
                    }
                };
                let expr = format!("{} ESCAPE '\\'", quote(&like_pattern(&text)));
                if kind == ValueKind::Page {
                    self.sort_key_condition(join_variable, &format!("{operator} {expr}"))
                } else {
                    SqlCondition::new_filter(format!("{join_variable} {operator} {expr}"))
                }
            }
        };
        self.add_order_by_data_for_property(&mut condition, join_variable, order_by, Some(kind));
        condition
    }

    /// Pages compare by sort key, literals by value.
    fn comparison_condition(&mut self, value: &DataItem, operator: &str, join_variable: &str) -> SqlCondition {
        match value {
            DataItem::Page(page) => {
                self.sort_key_condition(join_variable, &format!("{operator} {}", quote(&page.text())))
            }
            other => match self.sql_value(other) {
                Some(v) => SqlCondition::new_filter(format!("{join_variable} {operator} {v}")),
                None => SqlCondition::new_false(),
            },
        }
    }

    /// Join the object id row of `join_variable` and test its sort key.
    fn sort_key_condition(&mut self, join_variable: &str, test: &str) -> SqlCondition {
        let alias = self.next_alias();
        let mut condition = SqlCondition::new_where(
            vec![format!("{OBJECT_IDS} AS {alias}")],
            vec![
                format!("{alias}.smw_id = {join_variable}"),
                format!("{alias}.smw_sortkey {test}"),
            ],
        );
        condition.join_tables.insert(OBJECT_IDS.to_string());
        condition
    }

    /// Stored form of a data item. Unknown pages have no id.
    fn sql_value(&self, item: &DataItem) -> Option<SqlValue> {
        Some(match item {
            DataItem::Page(page) => SqlValue::Id(self.store.backend_identifier(page)?),
            DataItem::Blob(text) | DataItem::Uri(text) => SqlValue::Text(text.clone()),
            DataItem::Number(n) => SqlValue::Number(*n),
            DataItem::Boolean(b) => SqlValue::Bool(*b),
        })
    }
}

fn kind_name(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Page => "page",
        ValueKind::Blob => "text",
        ValueKind::Number => "number",
        ValueKind::Boolean => "boolean",
        ValueKind::Uri => "URI",
    }
}

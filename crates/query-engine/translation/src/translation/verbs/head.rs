//! head: at most `n` rows.

use crate::translation::state::QueryState;

/// Limits the current SELECT. An existing smaller limit wins.
pub fn head(state: &QueryState, n: u32) -> QueryState {
    let mut select = state.last_stage().clone();
    select.limit.limit = Some(select.limit.limit.map_or(n, |limit| limit.min(n)));
    tracing::debug!(
        verb = "head",
        stages = state.stages().depth() + 1,
        wrapped = false,
        "applied verb"
    );
    state.append(select, state.aliases())
}

#[cfg(test)]
mod tests {
    use query_engine_metadata::metadata::Dialect;

    use super::super::tests::{people, show};
    use super::super::Verbs;

    #[test]
    fn limits_the_query() {
        let state = people(Dialect::Postgres).head(5).unwrap();
        assert!(show(&state).ends_with(r#"AS "people_0" LIMIT 5"#));
    }

    #[test]
    fn the_smaller_limit_wins() {
        let state = people(Dialect::Postgres).head(2).unwrap();
        let state = state.head(10).unwrap();
        assert!(show(&state).ends_with("LIMIT 2"));
    }
}

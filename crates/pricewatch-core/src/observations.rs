use std::collections::BTreeMap;

use tracing::info;

use crate::db::DbPool;
use crate::error::Result;
use crate::types::{Observation, ProductDay};

/// Read every worker report joined with its task.
pub async fn fetch_observations(pool: &DbPool) -> Result<Vec<Observation>> {
    let observations = sqlx::query_as::<_, Observation>(
        r#"
            SELECT
                a.hit_id AS hit_id,
                a.assignment_id AS assignment_id,
                h.url_param AS url,
                h.domain_name AS domain_name,
                h.creation_time AS created_at,
                a.submit_time AS submitted_at,
                a.in_stock AS in_stock,
                a.price AS price,
                a.currency AS currency,
                a.quantity AS quantity
            FROM assignments a
            JOIN hits h ON a.hit_id = h.hit_id
            ORDER BY a.submit_time, a.assignment_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    info!(count = observations.len(), "fetched raw observations");
    Ok(observations)
}

/// Group reports by marketplace, product and task date.
pub fn group_by_product_day(
    observations: Vec<Observation>,
) -> BTreeMap<ProductDay, Vec<Observation>> {
    let mut groups: BTreeMap<ProductDay, Vec<Observation>> = BTreeMap::new();
    for observation in observations {
        let key = ProductDay {
            marketplace: observation.marketplace(),
            url: observation.url.clone(),
            date: observation.date(),
        };
        groups.entry(key).or_default().push(observation);
    }
    groups
}

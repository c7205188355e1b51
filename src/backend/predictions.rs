use crate::backend::ApiClient;
use crate::error::Error;
use crate::types::PredictionRecord;

// ---------------------------------------------------------------------------
// Prediction endpoints
// ---------------------------------------------------------------------------

/// Latest predictions across the user's repositories.
pub async fn latest(api: &ApiClient) -> Result<Vec<PredictionRecord>, Error> {
    api.get_json("/prediction/latest", &[]).await
}

/// Fetch predictions for a set of runs.
///
/// Settled records (actual outcome recorded) are immutable, so they are
/// served from the client cache; everything else is fetched fresh — an
/// unsettled prediction may still change server-side.
pub async fn batch(api: &ApiClient, run_ids: &[u64]) -> Result<Vec<PredictionRecord>, Error> {
    let mut records = Vec::with_capacity(run_ids.len());
    let mut missing = Vec::new();

    for id in run_ids {
        match api.prediction_cache().get(id).await {
            Some(hit) => records.push(hit),
            None => missing.push(*id),
        }
    }

    if !missing.is_empty() {
        let ids = missing
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let fetched: Vec<PredictionRecord> = api
            .get_json("/prediction/batch", &[("github_run_ids", ids)])
            .await?;
        for record in &fetched {
            if record.is_settled() {
                api.prediction_cache()
                    .insert(record.run_id, record.clone())
                    .await;
            }
        }
        records.extend(fetched);
    }

    Ok(records)
}

/// Prediction detail for a single run.
pub async fn result(api: &ApiClient, run_id: u64) -> Result<PredictionRecord, Error> {
    api.get_json(&format!("/prediction/results/{run_id}"), &[])
        .await
}

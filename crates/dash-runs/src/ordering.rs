use std::cmp::Reverse;

use crate::model::RunResource;

/// Most recently started first; runs that have not started go last. Ties keep
/// their input order.
pub fn sort_runs_by_start_time<R: RunResource>(runs: &mut [R]) {
    // `None` orders below any time, so reversed it lands after all of them.
    runs.sort_by_cached_key(|run| Reverse(run.parsed_start_time()));
}

pub fn sorted_runs_by_start_time<R: RunResource + Clone>(runs: &[R]) -> Vec<R> {
    let mut sorted = runs.to_vec();
    sort_runs_by_start_time(&mut sorted);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PipelineRun;
    use serde_json::json;

    fn run(id: &str, start: Option<&str>) -> PipelineRun {
        serde_json::from_value(json!({
            "metadata": { "name": id, "uid": id },
            "status": { "startTime": start }
        }))
        .expect("pipeline run")
    }

    fn ids(runs: &[PipelineRun]) -> Vec<&str> {
        runs.iter().map(|r| r.metadata.name.as_str()).collect()
    }

    #[test]
    fn unstarted_runs_sort_last_and_stay_stable() {
        let runs = vec![
            run("1", None),
            run("2", Some("2024-01-02")),
            run("3", Some("2024-01-01")),
            run("4", None),
        ];
        let sorted = sorted_runs_by_start_time(&runs);
        assert_eq!(ids(&sorted), vec!["2", "3", "1", "4"]);
        assert_eq!(ids(&runs), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn equal_start_times_keep_input_order() {
        let mut runs = vec![
            run("a", Some("2024-03-01T10:00:00Z")),
            run("b", Some("2024-03-01T12:00:00Z")),
            run("c", Some("2024-03-01T10:00:00Z")),
        ];
        sort_runs_by_start_time(&mut runs);
        assert_eq!(ids(&runs), vec!["b", "a", "c"]);
    }

    #[test]
    fn unparseable_start_time_counts_as_unstarted() {
        let runs = vec![run("bad", Some("not a time")), run("ok", Some("2024-01-01T00:00:00Z"))];
        assert_eq!(ids(&sorted_runs_by_start_time(&runs)), vec!["ok", "bad"]);
    }
}

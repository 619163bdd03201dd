use chrono::NaiveDate;

use crate::dag::{DagDef, DefaultArgs};
use crate::task::{RunNowTaskDef, default_connection_id, default_polling_period_secs};

pub const AGRICULTURAL_DAG_ID: &str = "Agricultural_Crop_Production_databricks_etl";
pub const AGRICULTURAL_TASK_ID: &str = "run_agricultural_crop_production_serverless_job";
pub const AGRICULTURAL_JOB_ID: u64 = 616190703118881;

/// The Agricultural Crop Production ETL trigger (Bronze → Silver → Gold).
///
/// Manual only, one retry after five minutes.
pub fn agricultural_crop_production() -> DagDef {
  DagDef {
    dag_id: AGRICULTURAL_DAG_ID.to_string(),
    description: "Trigger Databricks Serverless Job for Agricultural Crop Production ETL"
      .to_string(),
    default_args: DefaultArgs {
      owner: "kaushik".to_string(),
      depends_on_past: false,
      retries: 1,
      retry_delay_secs: 5 * 60,
    },
    start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
    schedule: None,
    catchup: false,
    tags: ["Agriculture", "ETL", "Databricks", "Serverless"]
      .into_iter()
      .map(String::from)
      .collect(),
    task: RunNowTaskDef {
      task_id: AGRICULTURAL_TASK_ID.to_string(),
      connection_id: default_connection_id(),
      job_id: AGRICULTURAL_JOB_ID,
      polling_period_secs: default_polling_period_secs(),
    },
  }
}

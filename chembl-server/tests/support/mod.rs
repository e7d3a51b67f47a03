#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chembl_client::traits::{
    ChemUtilities, ClientError, ClientResult, DataService, Record, Resource, UtilityFunction,
};
use chembl_config::ServerConfig;
use chembl_server::{SharedService, build_service};
use serde_json::{Value, json};

pub type Calls = Arc<Mutex<Vec<String>>>;

/// In-memory stand-in for both ChEMBL services.
#[derive(Default)]
pub struct FakeChembl {
    calls: Calls,
}

impl FakeChembl {
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn log(&self, entry: String) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

fn render(pairs: &[(String, Value)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl DataService for FakeChembl {
    async fn filter(
        &self,
        resource: Resource,
        criteria: &[(String, Value)],
    ) -> ClientResult<Vec<Record>> {
        self.log(format!("filter {resource} {}", render(criteria)));
        match resource {
            Resource::Tissue => Err(ClientError::Status {
                status: 500,
                body: "database offline".into(),
            }),
            _ => {
                let mut record = Record::new();
                record.insert("resource".into(), json!(resource.as_str()));
                Ok(vec![record])
            }
        }
    }

    async fn all(&self, resource: Resource) -> ClientResult<Vec<Record>> {
        self.log(format!("all {resource}"));
        Ok(Vec::new())
    }
}

#[async_trait]
impl ChemUtilities for FakeChembl {
    async fn call(
        &self,
        function: UtilityFunction,
        inputs: &[(String, Value)],
    ) -> ClientResult<Value> {
        self.log(format!("call {function} {}", render(inputs)));
        match function {
            UtilityFunction::CanonicalizeSmiles => Ok(json!("CCO")),
            UtilityFunction::Is3D => Ok(json!("False")),
            UtilityFunction::ChemblDescriptors => Ok(json!([{"qed_weighted": 0.41}])),
            UtilityFunction::Status => Ok(json!({"status": "UP"})),
            UtilityFunction::Standardize => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(json!([]))
            }
            UtilityFunction::GetParent => Ok(json!({"unexpected": "object"})),
            _ => Ok(json!("ok")),
        }
    }
}

/// Service over a fresh fake with a short utility deadline.
pub fn service() -> (SharedService, Arc<FakeChembl>) {
    let mut config = ServerConfig::default();
    config.deadlines.utility_secs = 0.3;
    let fake = Arc::new(FakeChembl::default());
    let service = build_service(
        &config,
        Arc::clone(&fake) as Arc<dyn DataService>,
        Arc::clone(&fake) as Arc<dyn ChemUtilities>,
    )
    .unwrap();
    (service, fake)
}

use std::sync::Arc;

use crate::config::{Config, LogFormat};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use wealthdesk_core::{
    accounts::{AccountService, AccountServiceTrait},
    billing::{BillingService, BillingServiceTrait},
    fee_schedules::{FeeScheduleService, FeeScheduleServiceTrait},
    groups::{GroupService, GroupServiceTrait},
};
use wealthdesk_storage_sqlite::{
    accounts::AccountRepository, billing::BillingRepository, db,
    fee_schedules::FeeScheduleRepository, groups::GroupRepository,
};

pub struct AppState {
    pub fee_schedule_service: Arc<dyn FeeScheduleServiceTrait>,
    pub group_service: Arc<dyn GroupServiceTrait>,
    pub account_service: Arc<dyn AccountServiceTrait>,
    pub billing_service: Arc<dyn BillingServiceTrait>,
}

/// Installs the global subscriber. Records from the `log` facade used by
/// the core and storage crates are forwarded as well.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let fee_schedule_repo = Arc::new(FeeScheduleRepository::new(pool.clone(), writer.clone()));
    let group_repo = Arc::new(GroupRepository::new(pool.clone(), writer.clone()));
    let account_repo = Arc::new(AccountRepository::new(pool.clone(), writer.clone()));
    let billing_repo = Arc::new(BillingRepository::new(pool.clone(), writer));

    let fee_schedule_service = Arc::new(FeeScheduleService::new(fee_schedule_repo.clone()));
    let group_service = Arc::new(GroupService::new(
        group_repo.clone(),
        fee_schedule_repo.clone(),
    ));
    let account_service = Arc::new(AccountService::new(
        account_repo.clone(),
        group_repo.clone(),
        fee_schedule_repo.clone(),
    ));
    let billing_service = Arc::new(BillingService::new(
        billing_repo,
        account_repo,
        group_repo,
        fee_schedule_repo,
    ));

    Ok(Arc::new(AppState {
        fee_schedule_service,
        group_service,
        account_service,
        billing_service,
    }))
}

use crate::api::Mode;
use crate::args::DashboardArgs;
use crate::commands::{cursor_for, render, signed_in_gateway, Out};
use crate::controller::{Dashboard, DashboardView, LoadOutcome};
use crate::error::{tagged, ErrorType};
use crate::{Config, Result};
use tracing::warn;

/// Handles `fintrack dashboard`: the month's totals, its expenses by category and the history that
/// ends at that month. One failed view is reported with the other still shown; the command only
/// fails when both do.
pub async fn dashboard(
    config: Config,
    mode: Mode,
    args: DashboardArgs,
) -> Result<Out<DashboardView>> {
    let period = cursor_for(args.period())?.period();
    let months = args.months().unwrap_or_else(|| config.history_months());
    let gateway = signed_in_gateway(&config, mode).await?;
    let dashboard = Dashboard::new(gateway, months);
    let (summary, history) = dashboard.load(period).await;
    let view = dashboard.view();
    if summary == LoadOutcome::Failed && history == LoadOutcome::Failed {
        let message = view.summary_error.clone().unwrap_or_default();
        return Err(tagged(ErrorType::FetchFailed, message));
    }
    for error in [&view.summary_error, &view.history_error].into_iter().flatten() {
        warn!("{error}");
    }
    let table = render::dashboard(&view);
    let message = format!("Balance for {period}: {}", view.summary.balance());
    Ok(Out::new(message, view).with_table(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::PeriodArgs;
    use crate::model::Period;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_dashboard() {
        let env = TestEnv::new().await;
        let out = dashboard(env.config(), Mode::Testing, DashboardArgs::default())
            .await
            .unwrap();
        let view = out.structure().unwrap();
        assert_eq!(view.period, Some(Period::current()));
        assert_eq!(view.summary.total_incomes().to_string(), "R$ 6.200,00");
        assert_eq!(view.summary.total_expenses().to_string(), "R$ 2.331,77");
        assert_eq!(view.history.len(), 4);
        assert!(out.message().ends_with("R$ 3.868,23"));
        assert!(out.table().unwrap().contains("Despesas por categoria"));
    }

    #[tokio::test]
    async fn test_dashboard_months() {
        let env = TestEnv::new().await;
        let args = DashboardArgs::new(PeriodArgs::default(), Some(2));
        let out = dashboard(env.config(), Mode::Testing, args).await.unwrap();
        assert_eq!(out.structure().unwrap().history.len(), 2);
    }

    #[tokio::test]
    async fn test_dashboard_empty_month() {
        let env = TestEnv::new().await;
        let args = DashboardArgs::new(PeriodArgs::new(Some(6), Some(1990)), None);
        let out = dashboard(env.config(), Mode::Testing, args).await.unwrap();
        let view = out.structure().unwrap();
        assert!(view.summary.balance().is_zero());
        assert!(view.summary.expenses_by_category().is_empty());
        assert_eq!(view.history.len(), 4);
    }
}

//! Transaction command handlers: list, delete, create, and the categories a transaction can have.

use crate::api::Mode;
use crate::args::{CategoriesArgs, CreateArgs, DeleteArgs, TransactionsArgs};
use crate::commands::{ask, cursor_for, render, signed_in_gateway, Out};
use crate::controller::{
    DeleteOutcome, ListView, LoadOutcome, TransactionForm, TransactionList, CONFIRM_DELETE,
    CREATE_SUCCEEDED,
};
use crate::error::{tagged, ErrorType, IntoResult};
use crate::model::{categories_for, Category, Transaction};
use crate::{Config, Result};
use anyhow::Context;
use tokio::io::BufReader;

const CATEGORIES_FAILED: &str = "Erro ao buscar categorias";

/// Handles `fintrack transactions`: loads the month's transactions, optionally narrowed by the
/// server to one category or type, and shows the ones that match the search text.
pub async fn transactions(
    config: Config,
    mode: Mode,
    args: TransactionsArgs,
) -> Result<Out<ListView>> {
    let period = cursor_for(args.period())?.period();
    let mut list = TransactionList::new(signed_in_gateway(&config, mode).await?);
    if let Some(category) = args.category() {
        list = list.with_category(category);
    }
    if let Some(transaction_type) = args.transaction_type() {
        list = list.with_type(transaction_type);
    }
    if let Some(search) = args.search() {
        list.filter(search);
    }
    if list.load(period).await == LoadOutcome::Failed {
        let message = list.error().unwrap_or_default();
        return Err(tagged(ErrorType::FetchFailed, message));
    }
    let view = list.view();
    let table = render::transactions(&view);
    let message = format!(
        "Showing {} of {} transactions for {period}",
        view.visible.len(),
        view.total
    );
    Ok(Out::new(message, view).with_table(table))
}

/// Handles `fintrack delete`. Unless `--yes` is given the user is asked to confirm on stdin.
pub async fn delete(config: Config, mode: Mode, args: DeleteArgs) -> Result<Out<()>> {
    let gateway = signed_in_gateway(&config, mode).await?;
    let confirmed = args.yes()
        || ask(
            &mut BufReader::new(tokio::io::stdin()),
            &mut std::io::stdout(),
            CONFIRM_DELETE,
        )
        .await?;
    let list = TransactionList::new(gateway);
    let outcome = list.delete(args.id(), |_| confirmed).await;
    let notice = list
        .take_notices()
        .pop()
        .map(|n| n.message().to_string())
        .unwrap_or_default();
    match outcome {
        DeleteOutcome::Declined => Ok("Nothing was deleted".into()),
        DeleteOutcome::Deleted => Ok(notice.into()),
        DeleteOutcome::Failed => Err(tagged(ErrorType::DeleteFailed, notice)),
    }
}

/// Handles `fintrack create`.
pub async fn create(config: Config, mode: Mode, args: CreateArgs) -> Result<Out<Transaction>> {
    let gateway = signed_in_gateway(&config, mode).await?;
    let categories = gateway
        .categories()
        .await
        .context(CATEGORIES_FAILED)
        .pub_result(ErrorType::FetchFailed)?;
    let form = TransactionForm::new()
        .with_description(args.description())
        .with_amount(args.amount())
        .with_date(args.date())
        .with_type(args.transaction_type())
        .with_category(args.category());
    let created = form.submit(gateway.as_ref(), &categories).await?;
    Ok(Out::new(CREATE_SUCCEEDED, created))
}

/// Handles `fintrack categories`.
pub async fn categories(
    config: Config,
    mode: Mode,
    args: CategoriesArgs,
) -> Result<Out<Vec<Category>>> {
    let gateway = signed_in_gateway(&config, mode).await?;
    let all = gateway
        .categories()
        .await
        .context(CATEGORIES_FAILED)
        .pub_result(ErrorType::FetchFailed)?;
    let shown: Vec<&Category> = match args.transaction_type() {
        Some(t) => categories_for(&all, t),
        None => all.iter().collect(),
    };
    let table = render::categories(&shown);
    let structure: Vec<Category> = shown.into_iter().cloned().collect();
    Ok(Out::new(format!("Found {} categories", structure.len()), structure).with_table(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::PeriodArgs;
    use crate::error::error_type;
    use crate::model::{Amount, PeriodCursor, TransactionType};
    use crate::test::TestEnv;
    use chrono::NaiveDate;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_transactions() {
        let env = TestEnv::new().await;
        let out = transactions(env.config(), Mode::Testing, TransactionsArgs::default())
            .await
            .unwrap();
        let view = out.structure().unwrap();
        assert_eq!(view.total, 7);
        assert_eq!(view.visible.len(), 7);
        assert_eq!(view.period, Some(PeriodCursor::now().period()));
        assert!(out.table().unwrap().contains("Supermercado"));
    }

    #[tokio::test]
    async fn test_transactions_search() {
        let env = TestEnv::new().await;
        let args = TransactionsArgs::new(PeriodArgs::default(), Some("ALUGUEL".to_string()));
        let out = transactions(env.config(), Mode::Testing, args).await.unwrap();
        let view = out.structure().unwrap();
        assert_eq!(view.visible.len(), 1);
        assert_eq!(view.visible[0].description(), "Aluguel");
        assert_eq!(view.total, 7);
    }

    #[tokio::test]
    async fn test_transactions_by_category_and_type() {
        let env = TestEnv::new().await;
        let args = TransactionsArgs::new(PeriodArgs::default(), None).with_category("c6");
        let out = transactions(env.config(), Mode::Testing, args).await.unwrap();
        let view = out.structure().unwrap();
        assert_eq!(view.total, 1);
        assert_eq!(view.visible[0].description(), "Aluguel");

        let args =
            TransactionsArgs::new(PeriodArgs::default(), None).with_type(TransactionType::Income);
        let out = transactions(env.config(), Mode::Testing, args).await.unwrap();
        let view = out.structure().unwrap();
        assert_eq!(view.total, 2);
        assert!(view
            .visible
            .iter()
            .all(|t| t.transaction_type() == TransactionType::Income));
    }

    #[tokio::test]
    async fn test_transactions_requires_login() {
        let env = TestEnv::new().await;
        env.sign_out().await;
        let err = transactions(env.config(), Mode::Testing, TransactionsArgs::default())
            .await
            .unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Unauthenticated));
    }

    #[tokio::test]
    async fn test_delete() {
        let env = TestEnv::new().await;
        let out = delete(env.config(), Mode::Testing, DeleteArgs::new("t01", true))
            .await
            .unwrap();
        assert_eq!(out.message(), "Sucesso ao deletar transação");
    }

    #[tokio::test]
    async fn test_delete_unknown() {
        let env = TestEnv::new().await;
        let err = delete(env.config(), Mode::Testing, DeleteArgs::new("nope", true))
            .await
            .unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::DeleteFailed));
        assert_eq!(err.to_string(), "Erro ao deletar transação");
    }

    #[tokio::test]
    async fn test_create() {
        let env = TestEnv::new().await;
        let args = CreateArgs::new(
            "Padaria",
            Amount::from_str("12,50").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 25).unwrap(),
            TransactionType::Expense,
            "c3",
        );
        let out = create(env.config(), Mode::Testing, args).await.unwrap();
        assert_eq!(out.message(), CREATE_SUCCEEDED);
        let created = out.structure().unwrap();
        assert_eq!(created.description(), "Padaria");
        assert_eq!(created.transaction_type(), TransactionType::Expense);
    }

    #[tokio::test]
    async fn test_create_invalid() {
        let env = TestEnv::new().await;
        let args = CreateArgs::new(
            "Salário extra",
            Amount::from_str("100").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 25).unwrap(),
            TransactionType::Income,
            "c3",
        );
        let err = create(env.config(), Mode::Testing, args).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::ValidationFailed));
    }

    #[tokio::test]
    async fn test_categories() {
        let env = TestEnv::new().await;
        let out = categories(env.config(), Mode::Testing, CategoriesArgs::default())
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().len(), 6);

        let args = CategoriesArgs::new(Some(TransactionType::Income));
        let out = categories(env.config(), Mode::Testing, args).await.unwrap();
        let names: Vec<&str> = out.structure().unwrap().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Salário", "Freelance"]);
        assert!(out.table().unwrap().contains("Receita"));
    }
}

//! The interactive `fintrack browse` session.
//!
//! Each line read from the input is one action. After every action the pending notices are
//! written, followed by whatever view the action touched.

use crate::api::Mode;
use crate::commands::{ask, render, signed_in_gateway, Out};
use crate::controller::{DeleteOutcome, Notice, Tracker, CONFIRM_DELETE};
use crate::model::PeriodCursor;
use crate::{Config, Result};
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "\
Comandos:
  next | prev        mês seguinte ou anterior
  month <1-12>       escolhe o mês no ano atual
  year <ano>         escolhe o ano, mantendo o mês
  years              anos disponíveis para escolha
  search <texto>     filtra pela descrição (vazio limpa o filtro)
  delete <id>        deleta uma transação
  retry              busca as transações de novo
  dashboard          resumo do mês e histórico
  help               esta ajuda
  quit               sair";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Next,
    Prev,
    Month(u32),
    Year(i32),
    Years,
    Search(String),
    Delete(String),
    Retry,
    Dashboard,
    Help,
    Quit,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let action = match word.to_lowercase().as_str() {
            "next" | "n" => Action::Next,
            "prev" | "p" => Action::Prev,
            "month" => Action::Month(
                rest.parse()
                    .map_err(|_| format!("Mês inválido: '{rest}'"))?,
            ),
            "year" => Action::Year(rest.parse().map_err(|_| format!("Ano inválido: '{rest}'"))?),
            "years" => Action::Years,
            "search" => Action::Search(rest.to_string()),
            "delete" if !rest.is_empty() => Action::Delete(rest.to_string()),
            "delete" => return Err("Informe o id da transação".to_string()),
            "retry" => Action::Retry,
            "dashboard" | "d" => Action::Dashboard,
            "help" | "?" => Action::Help,
            "quit" | "q" | "exit" => Action::Quit,
            _ => return Err(format!("Comando desconhecido: '{word}', digite 'help'")),
        };
        Ok(action)
    }
}

/// Handles `fintrack browse`, reading actions from stdin until `quit` or the end of input.
pub async fn browse(config: Config, mode: Mode) -> Result<Out<()>> {
    let gateway = signed_in_gateway(&config, mode).await?;
    let mut tracker = Tracker::new(PeriodCursor::now(), gateway, config.history_months());
    let mut input = BufReader::new(tokio::io::stdin());
    let mut output = std::io::stdout();
    let actions = browse_with(&mut tracker, &mut input, &mut output).await?;
    Ok(format!("Browsing ended after {actions} actions").into())
}

/// Runs a browse session over any input and output. Returns the number of actions performed.
pub async fn browse_with<R, W>(tracker: &mut Tracker, input: &mut R, output: &mut W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    tracker.refresh().await;
    show_list(tracker, output)?;
    let mut actions = 0;
    loop {
        write!(output, "> ")?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line).await? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let action = match line.parse::<Action>() {
            Ok(action) => action,
            Err(message) => {
                writeln!(output, "{message}")?;
                continue;
            }
        };
        debug!("Browse action {action:?}");
        actions += 1;
        match action {
            Action::Quit => break,
            Action::Help => writeln!(output, "{HELP}")?,
            Action::Years => {
                let years: Vec<String> = tracker
                    .cursor()
                    .selectable_years()
                    .iter()
                    .map(|y| y.to_string())
                    .collect();
                writeln!(output, "{}", years.join(" "))?;
            }
            Action::Next => {
                tracker.advance().await;
                show_list(tracker, output)?;
            }
            Action::Prev => {
                tracker.retreat().await;
                show_list(tracker, output)?;
            }
            Action::Month(month) => match tracker.set_month(month).await {
                Ok(_) => show_list(tracker, output)?,
                Err(e) => writeln!(output, "{e}")?,
            },
            Action::Year(year) => {
                tracker.set_year(year).await;
                show_list(tracker, output)?;
            }
            Action::Search(text) => {
                tracker.transactions().filter(&text);
                show_list(tracker, output)?;
            }
            Action::Retry => {
                tracker.transactions().retry().await;
                show_list(tracker, output)?;
            }
            Action::Delete(id) => {
                let confirmed = ask(input, output, CONFIRM_DELETE).await?;
                let outcome = tracker.transactions().delete(&id, |_| confirmed).await;
                if outcome != DeleteOutcome::Declined {
                    show_list(tracker, output)?;
                }
            }
            Action::Dashboard => {
                // Deletes since the last refresh change the totals.
                let dashboard = tracker.dashboard();
                dashboard.load(tracker.period()).await;
                write!(output, "{}", render::dashboard(&dashboard.view()))?;
            }
        }
    }
    Ok(actions)
}

fn show_list<W: Write>(tracker: &Tracker, output: &mut W) -> Result<()> {
    for notice in tracker.transactions().take_notices() {
        let mark = match notice {
            Notice::Success(_) => '✓',
            Notice::Failure(_) => '✗',
        };
        writeln!(output, "{mark} {}", notice.message())?;
    }
    write!(output, "{}", render::transactions(&tracker.transactions().view()))?;
    Ok(())
}

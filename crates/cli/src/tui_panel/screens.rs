use super::app::{App, Field};
use oneclick_core::{OptionQuote, OptionType};
use oneclick_panel::{ActivityLevel, PanelState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Row, Table},
    Frame,
};
use rust_decimal::Decimal;

pub fn render(f: &mut Frame, app: &App, state: &PanelState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Selection
            Constraint::Length(7), // Quotes
            Constraint::Min(6),    // Positions
            Constraint::Length(8), // Activity
            Constraint::Length(4), // Help
        ])
        .split(f.area());

    render_header(f, state, chunks[0]);
    render_selection(f, app, state, chunks[1]);
    render_quotes(f, state, chunks[2]);
    render_positions(f, state, chunks[3]);
    render_activity(f, state, chunks[4]);
    render_help(f, chunks[5]);
}

fn badge(on: bool, on_text: &'static str, off_text: &'static str, on_color: Color) -> Span<'static> {
    if on {
        Span::styled(
            format!(" {on_text} "),
            Style::default().fg(Color::Black).bg(on_color).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!(" {off_text} "), Style::default().fg(Color::DarkGray))
    }
}

fn render_header(f: &mut Frame, state: &PanelState, area: Rect) {
    let toggles = state.toggles();
    let line = Line::from(vec![
        Span::styled(
            "One-Click Options  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        badge(toggles.armed, "ARMED", "DISARMED", Color::Red),
        Span::raw(" "),
        badge(toggles.paper, "PAPER", "LIVE", Color::Yellow),
        Span::raw(" "),
        badge(toggles.auto_refresh, "AUTO-REFRESH", "MANUAL", Color::Green),
        Span::raw(format!("   strategy: {}", state.strategy_tag())),
    ]);
    let header = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_selection(f: &mut Frame, app: &App, state: &PanelState, area: Rect) {
    let selection = state.selection();
    let dash = || "-".to_string();

    let mut spans = Vec::new();
    for field in Field::ALL {
        let value = match field {
            Field::Exchange => selection.exchange.label().to_string(),
            Field::Symbol => selection.symbol.to_string(),
            Field::Expiry => selection.expiry.clone().unwrap_or_else(dash),
            Field::CeStrike => selection.ce_strike.map_or_else(dash, |s| s.to_string()),
            Field::PeStrike => selection.pe_strike.map_or_else(dash, |s| s.to_string()),
            Field::Lots => format!(
                "{} (qty {})",
                selection.lots,
                selection.quantity().map_or_else(dash, |q| q.to_string())
            ),
            Field::Product => selection.product.to_string(),
        };
        let style = if field == app.focus {
            Style::default().bg(Color::Blue).fg(Color::White)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!("{}: {value}", field.label()), style));
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
        format!("Spot: {}", state.view().spot.map_or_else(dash, |s| s.to_string())),
        Style::default().fg(Color::Cyan),
    ));

    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Selection"));
    f.render_widget(bar, area);
}

fn render_quotes(f: &mut Frame, state: &PanelState, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for (leg, area) in [(OptionType::Call, halves[0]), (OptionType::Put, halves[1])] {
        let title = state
            .selection()
            .contract(leg)
            .unwrap_or_else(|| format!("{leg} (no strike)"));
        let lines = quote_lines(state.view().quote(leg));
        let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(panel, area);
    }
}

fn quote_lines(quote: Option<&OptionQuote>) -> Vec<Line<'static>> {
    let Some(q) = quote else {
        return vec![Line::from(Span::styled(
            "No quote",
            Style::default().fg(Color::DarkGray),
        ))];
    };
    let float = |v: Option<f64>, precision: usize| {
        v.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
    };
    vec![
        Line::from(vec![
            Span::raw("LTP:   "),
            Span::styled(
                q.ltp.map_or_else(|| "-".to_string(), |v| format!("{v:.2}")),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(format!("IV:    {}", float(q.iv, 2))),
        Line::from(format!(
            "OI:    {}",
            q.open_interest.map_or_else(|| "-".to_string(), |v| v.to_string())
        )),
        Line::from(format!("Delta: {}", float(q.delta, 3))),
        Line::from(format!("Theta: {}", float(q.theta, 2))),
    ]
}

fn pnl_color(value: Decimal) -> Color {
    match value.cmp(&Decimal::ZERO) {
        std::cmp::Ordering::Greater => Color::Green,
        std::cmp::Ordering::Less => Color::Red,
        std::cmp::Ordering::Equal => Color::White,
    }
}

fn render_positions(f: &mut Frame, state: &PanelState, area: Rect) {
    let header = Row::new(vec!["Symbol", "Side", "Qty", "Avg", "LTP", "MTM"])
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let rows: Vec<Row> = state
        .positions()
        .positions
        .iter()
        .map(|p| {
            Row::new(vec![
                p.symbol.clone(),
                p.side().label().to_string(),
                p.display_quantity().to_string(),
                format!("{:.2}", p.average_price),
                format!("{:.2}", p.ltp),
                format!("{:.2}", p.mtm),
            ])
            .style(Style::default().fg(pnl_color(p.mtm)))
        })
        .collect();

    let total = state.total_mtm();
    let title = Line::from(vec![
        Span::raw("Positions  Total MTM: "),
        Span::styled(
            format!("{total:.2}"),
            Style::default().fg(pnl_color(total)).add_modifier(Modifier::BOLD),
        ),
    ]);

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, area);
}

fn render_activity(f: &mut Frame, state: &PanelState, area: Rect) {
    let items: Vec<ListItem> = state
        .activity()
        .iter()
        .rev()
        .map(|entry| {
            let color = match entry.level {
                ActivityLevel::Info => Color::White,
                ActivityLevel::Error => Color::Red,
            };
            ListItem::new(format!("{} {}", entry.at.format("%H:%M:%S"), entry.message))
                .style(Style::default().fg(color))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Activity"));
    f.render_widget(list, area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("↑ Buy CE | ↓ Buy PE | ← Sell CE | → Sell PE | r Sell both | Esc Close all"),
        Line::from(
            "Tab: Field | [ ]: Change | F1-F4: Buy/Sell CE/PE | F9: Panic | h: Arm | p: Paper | a: Auto-refresh | q: Quit",
        ),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

use fundboard_client::CreatedTransfer;
use fundboard_domain::{FieldErrors, Fund, ResetSummary};
use fundboard_ui_core::{
    CapTableRow, ErrorBanner, FundDetailView, ListView, OwnerDetailView, OwnersView, TransferRow,
    format_date, format_units,
};

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let header_cells: Vec<String> = headers.iter().map(|header| (*header).to_string()).collect();
    let separator: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();

    let mut lines = vec![line(&header_cells), line(&separator)];
    lines.extend(rows.iter().map(|row| line(row)));
    lines.join("\n")
}

pub fn fund_list(view: &ListView<Fund>) -> String {
    match view {
        ListView::Loading => "Loading funds...".to_string(),
        ListView::Failed(banner) => format!("{banner}\nRun the command again to retry."),
        ListView::Empty => "No funds yet. Create one with `fundboard funds create`.".to_string(),
        ListView::Populated(funds) => {
            let rows: Vec<Vec<String>> = funds
                .iter()
                .map(|fund| {
                    vec![
                        fund.id.to_string(),
                        fund.name.clone(),
                        format_units(fund.total_units),
                        format_date(fund.created_at),
                    ]
                })
                .collect();
            table(&["ID", "Name", "Total units", "Created"], &rows)
        }
    }
}

pub fn cap_table_rows(rows: &[CapTableRow]) -> String {
    if rows.is_empty() {
        return "No owners.".to_string();
    }
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.owner_name.clone(),
                row.units.clone(),
                row.percentage.clone(),
                row.acquired.clone(),
            ]
        })
        .collect();
    table(&["Owner", "Units", "Ownership", "Acquired"], &rows)
}

pub fn transfer_rows(rows: &[TransferRow]) -> String {
    if rows.is_empty() {
        return "No transfers yet.".to_string();
    }
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.transferred.clone(),
                row.from_owner.clone(),
                row.to_owner.clone(),
                row.units.clone(),
            ]
        })
        .collect();
    table(&["Date", "From", "To", "Units"], &rows)
}

pub fn fund_detail(view: &FundDetailView) -> String {
    format!(
        "{name}\n  ID: {id}\n  Total units: {total}\n  Created: {created}\n\nCap table\n{cap_table}\n\nTransfer history\n{transfers}",
        name = view.header.name,
        id = view.header.id,
        total = view.header.total_units,
        created = view.header.created,
        cap_table = cap_table_rows(&view.cap_table),
        transfers = transfer_rows(&view.transfers),
    )
}

pub fn owners(view: &OwnersView) -> String {
    if view.is_empty() {
        return "No owners yet.".to_string();
    }
    let rows: Vec<Vec<String>> = view
        .owners
        .iter()
        .map(|owner| {
            let holdings: Vec<String> = owner
                .holdings
                .iter()
                .map(|holding| {
                    format!(
                        "{}: {} ({})",
                        holding.fund_name, holding.units, holding.percentage
                    )
                })
                .collect();
            vec![
                owner.name.clone(),
                owner.fund_count.to_string(),
                holdings.join("; "),
            ]
        })
        .collect();
    table(&["Owner", "Funds", "Holdings"], &rows)
}

pub fn owner_detail(view: &OwnerDetailView) -> String {
    let timeline = if view.timeline.is_empty() {
        "No transfers yet.".to_string()
    } else {
        let rows: Vec<Vec<String>> = view
            .timeline
            .iter()
            .map(|movement| {
                vec![
                    movement.transferred.clone(),
                    movement.description.clone(),
                    movement.units.clone(),
                ]
            })
            .collect();
        table(&["Date", "Movement", "Units"], &rows)
    };
    format!(
        "{owner} in {fund}\n  Units: {units}\n  Ownership: {percentage}\n  Received: {received}\n  Sent: {sent}\n\nTimeline\n{timeline}",
        owner = view.owner_name,
        fund = view.fund_name,
        units = view.units,
        percentage = view.percentage,
        received = view.total_received,
        sent = view.total_sent,
    )
}

pub fn fund_created(fund: &Fund) -> String {
    format!(
        "Created fund {} ({}) with {} units",
        fund.name,
        fund.id,
        format_units(fund.total_units)
    )
}

pub fn transfer_created(created: &CreatedTransfer) -> String {
    let transfer = &created.transfer;
    let mut line = format!(
        "Transferred {} units from {} to {} ({})",
        format_units(transfer.units),
        transfer.from_owner,
        transfer.to_owner,
        transfer.id
    );
    if created.replayed {
        line.push_str("\nAlready processed; the original transfer was returned.");
    }
    line
}

pub fn reset_summary(summary: &ResetSummary) -> String {
    let count = |value: Option<u64>| value.map_or_else(|| "-".to_string(), |n| n.to_string());
    format!(
        "{}\n  Funds deleted: {}\n  Transfers deleted: {}\n  Ownership records deleted: {}",
        summary.message.as_deref().unwrap_or("All data deleted"),
        count(summary.deleted_funds),
        count(summary.deleted_transfers),
        count(summary.deleted_ownership),
    )
}

/// Banner line followed by one line per field error.
pub fn failure(banner: Option<&ErrorBanner>, fields: &FieldErrors) -> String {
    let mut lines = Vec::new();
    if let Some(banner) = banner {
        lines.push(banner.to_string());
    }
    for (field, message) in fields.iter() {
        lines.push(format!("  {}: {message}", field.label()));
    }
    lines.join("\n")
}

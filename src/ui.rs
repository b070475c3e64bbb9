use crate::models::{HistoryRow, Ledger};
use chrono::NaiveDate;

pub fn render_index(ledger: &Ledger, today: &str) -> String {
    let rows: String = ledger
        .history_with_totals()
        .iter()
        .map(render_row)
        .collect();
    let disabled = if ledger.can_decrement() { "" } else { " disabled" };
    let reset_disabled = if ledger.can_reset() { "" } else { " disabled" };

    INDEX_HTML
        .replace("{{DATE}}", &escape_html(today))
        .replace("{{TOTAL}}", &ledger.total_count.to_string())
        .replace("{{TODAY}}", &ledger.total_on(today).to_string())
        .replace("{{DEC_DISABLED}}", disabled)
        .replace("{{RESET_DISABLED}}", reset_disabled)
        .replace("{{EMPTY_HIDDEN}}", if rows.is_empty() { "" } else { " hidden" })
        .replace("{{HISTORY_ROWS}}", &rows)
}

/// `"2026-01-05"` becomes `"Mon, Jan 5"`. Keys that are not dates pass through.
pub fn day_label(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(day) => day.format("%a, %b %-d").to_string(),
        Err(_) => date.to_string(),
    }
}

fn render_row(row: &HistoryRow) -> String {
    format!(
        "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
        escape_html(&day_label(&row.date)),
        row.daily_count,
        row.running_total
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0, viewport-fit=cover" />
  <title>Jobs Applied</title>
  <style>
    :root {
      --bg: #171717;
      --card: #262626;
      --panel: #404040;
      --line: #525252;
      --muted: #a3a3a3;
      --ink: #ffffff;
      --danger: #dc2626;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
      touch-action: manipulation;
      padding: env(safe-area-inset-top) 16px env(safe-area-inset-bottom);
    }

    .card {
      max-width: 480px;
      margin: 16px auto;
      background: var(--card);
      border: 1px solid var(--panel);
      border-radius: 12px;
      padding: 24px 0;
      display: grid;
      gap: 24px;
    }

    h1 {
      margin: 0;
      text-align: center;
      font-size: 1.25rem;
      font-weight: 600;
    }

    .counter {
      display: flex;
      flex-direction: column;
      align-items: center;
      gap: 16px;
      padding: 0 16px;
    }

    .total {
      font-size: 3.75rem;
      font-weight: 700;
      margin-bottom: 16px;
    }

    .controls {
      display: flex;
      gap: 16px;
      width: 100%;
      max-width: 320px;
    }

    .controls form {
      flex: 1;
    }

    button {
      width: 100%;
      height: 64px;
      font-size: 1.6rem;
      color: var(--ink);
      background: var(--panel);
      border: 1px solid var(--line);
      border-radius: 8px;
      cursor: pointer;
      transition: transform 120ms ease;
    }

    button:active {
      transform: scale(0.95);
    }

    button:disabled {
      opacity: 0.5;
      cursor: default;
    }

    .reset-form {
      width: 100%;
      max-width: 320px;
    }

    .reset-form button {
      height: 48px;
      font-size: 1rem;
      background: var(--danger);
      border-color: var(--danger);
    }

    section {
      margin: 0 16px;
    }

    h2 {
      font-size: 1rem;
      font-weight: 500;
      margin: 0 0 8px;
    }

    .today {
      background: var(--panel);
      border-radius: 8px;
      padding: 16px;
    }

    .today .value {
      display: block;
      text-align: center;
      font-size: 1.9rem;
      font-weight: 700;
    }

    .today .value small {
      font-size: 0.85rem;
      font-weight: 400;
      color: var(--muted);
      margin-left: 8px;
    }

    .history {
      background: var(--panel);
      border-radius: 8px;
      padding: 8px;
      overflow-x: auto;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.9rem;
    }

    th,
    td {
      padding: 12px;
      text-align: left;
      border-bottom: 1px solid var(--line);
    }

    tr:last-child td {
      border-bottom: none;
    }

    .num {
      text-align: right;
    }

    .empty {
      color: var(--muted);
      text-align: center;
      margin: 12px 0;
    }

    .status {
      min-height: 1.2em;
      text-align: center;
      font-size: 0.85rem;
      color: var(--muted);
      margin: 0;
    }
  </style>
</head>
<body>
  <main class="card" data-date="{{DATE}}">
    <h1>Jobs Applied</h1>

    <div class="counter">
      <div class="total" id="total">{{TOTAL}}</div>
      <div class="controls">
        <form method="post" action="/counter/decrement" data-action="decrement">
          <button type="submit" id="decrement" aria-label="Decrement"{{DEC_DISABLED}}>&minus;</button>
        </form>
        <form method="post" action="/counter/increment" data-action="increment">
          <button type="submit" id="increment" aria-label="Increment">+</button>
        </form>
      </div>
      <form class="reset-form" method="post" action="/counter/reset" data-action="reset">
        <button type="submit" id="reset"{{RESET_DISABLED}}>&#8635; Reset</button>
      </form>
      <p class="status" id="status" role="status"></p>
    </div>

    <section>
      <h2>Today&apos;s Applications</h2>
      <div class="today">
        <span class="value"><span id="today">{{TODAY}}</span><small>today</small></span>
      </div>
    </section>

    <section>
      <h2>History</h2>
      <div class="history">
        <table>
          <thead>
            <tr><th>Date</th><th class="num">Daily</th><th class="num">Total</th></tr>
          </thead>
          <tbody id="history-rows">{{HISTORY_ROWS}}</tbody>
        </table>
        <p class="empty" id="history-empty"{{EMPTY_HIDDEN}}>No applications logged yet</p>
      </div>
    </section>
  </main>

  <script>
    const totalEl = document.getElementById('total');
    const todayEl = document.getElementById('today');
    const decrementBtn = document.getElementById('decrement');
    const resetBtn = document.getElementById('reset');
    const rowsEl = document.getElementById('history-rows');
    const emptyEl = document.getElementById('history-empty');
    const statusEl = document.getElementById('status');

    const setStatus = (text) => {
      statusEl.textContent = text;
    };

    const updateCounter = (data) => {
      totalEl.textContent = data.total_count;
      todayEl.textContent = data.today_total;
      decrementBtn.disabled = !data.can_decrement;
      resetBtn.disabled = !data.can_reset;
    };

    const cell = (text, numeric) => {
      const td = document.createElement('td');
      td.textContent = text;
      if (numeric) {
        td.className = 'num';
      }
      return td;
    };

    const renderHistory = (history) => {
      rowsEl.replaceChildren(
        ...history.entries.map((entry) => {
          const tr = document.createElement('tr');
          tr.append(
            cell(entry.label, false),
            cell(entry.daily_count, true),
            cell(entry.running_total, true)
          );
          return tr;
        })
      );
      emptyEl.hidden = history.entries.length > 0;
    };

    const loadHistory = async () => {
      const res = await fetch('/api/history');
      if (!res.ok) {
        throw new Error('Unable to load history');
      }
      renderHistory(await res.json());
    };

    const send = async (action) => {
      const res = await fetch('/api/action', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ action })
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      updateCounter(await res.json());
      await loadHistory();
      setStatus('');
    };

    document.querySelectorAll('form[data-action]').forEach((form) => {
      form.addEventListener('submit', (event) => {
        event.preventDefault();
        send(form.dataset.action).catch((err) => setStatus(err.message));
      });
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayRecord;
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_ledger_disables_decrement_and_reset() {
        let html = render_index(&Ledger::default(), "2026-01-05");
        assert!(html.contains(r#"id="decrement" aria-label="Decrement" disabled"#));
        assert!(html.contains(r#"id="reset" disabled"#));
        assert!(!html.contains(r#"id="increment" aria-label="Increment" disabled"#));
        assert!(html.contains(r#"id="history-empty">"#));
    }

    #[test]
    fn renders_totals_and_rows() {
        let mut ledger = Ledger::default();
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        ledger.increment_at(now);
        ledger.increment_at(now);

        let html = render_index(&ledger, "2026-01-05");
        assert!(html.contains(r#"<div class="total" id="total">2</div>"#));
        assert!(html.contains(r#"<span id="today">2</span>"#));
        assert!(html.contains(
            r#"<tr><td>Mon, Jan 5</td><td class="num">2</td><td class="num">2</td></tr>"#
        ));
        assert!(html.contains(r#"id="decrement" aria-label="Decrement">"#));
        assert!(html.contains(r#"id="history-empty" hidden>"#));
    }

    #[test]
    fn day_label_formats_dates() {
        assert_eq!(day_label("2026-01-05"), "Mon, Jan 5");
        assert_eq!(day_label("2025-12-25"), "Thu, Dec 25");
        assert_eq!(day_label("someday"), "someday");
    }

    #[test]
    fn stored_keys_are_escaped() {
        let mut ledger = Ledger::default();
        ledger
            .history
            .insert("<b>x</b>".to_string(), DayRecord::default());
        let html = render_index(&ledger, "2026-01-05");
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(!html.contains("<b>x</b>"));
    }
}

use crate::models::TodayResponse;

pub fn render_index(today: &TodayResponse) -> String {
    INDEX_HTML
        .replace("{{DATE}}", &today.date.to_string())
        .replace("{{TOTAL}}", &today.stats.total.to_string())
        .replace("{{COMPLETED}}", &today.stats.completed.to_string())
        .replace("{{IN_PROGRESS}}", &today.stats.in_progress.to_string())
        .replace("{{RATE}}", &today.completion_rate.to_string())
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>HabitFlow</title>
  <style>
    :root {
      --bg: #f4f6fb;
      --ink: #1f2433;
      --muted: #6b7083;
      --accent: #3b82f6;
      --done: #10b981;
      --warn: #f59e0b;
      --card: #ffffff;
      --line: rgba(31, 36, 51, 0.1);
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
    }
    header {
      padding: 20px 24px;
      border-bottom: 1px solid var(--line);
      background: var(--card);
    }
    header h1 { margin: 0; font-size: 1.6rem; color: var(--accent); }
    header p { margin: 4px 0 0; color: var(--muted); }
    main { max-width: 1100px; margin: 0 auto; padding: 24px; display: grid; gap: 24px; }
    .cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 16px; }
    .card {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 14px;
      padding: 16px;
    }
    .label { font-size: 0.85rem; color: var(--muted); }
    .value { font-size: 1.8rem; font-weight: 700; }
    .value.done { color: var(--done); }
    .value.warn { color: var(--warn); }
    .controls { display: flex; flex-wrap: wrap; gap: 12px; }
    input, select, button {
      font: inherit;
      padding: 8px 12px;
      border-radius: 8px;
      border: 1px solid var(--line);
      background: var(--card);
    }
    button { cursor: pointer; }
    button.primary { background: var(--accent); color: white; border-color: var(--accent); }
    #habits { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 16px; }
    .habit h3 { margin: 0 0 4px; display: flex; align-items: center; gap: 8px; }
    .dot { width: 12px; height: 12px; border-radius: 50%; display: inline-block; }
    .bar { height: 8px; background: var(--line); border-radius: 4px; overflow: hidden; margin: 8px 0; }
    .bar > span { display: block; height: 100%; background: var(--accent); }
    .recent { display: flex; gap: 4px; margin: 8px 0; }
    .recent span { width: 18px; height: 18px; border-radius: 4px; background: var(--line); }
    .recent span.done { background: var(--done); }
    .recent span.today { outline: 2px solid var(--accent); }
    .row { display: flex; gap: 8px; align-items: center; justify-content: space-between; }
    #chart { width: 100%; height: 220px; display: block; }
    .chart-bar { fill: var(--accent); }
    .chart-label { fill: var(--muted); font-size: 11px; }
    .week-day { display: flex; justify-content: space-between; padding: 4px 0; }
    .week-day.today { font-weight: 700; color: var(--accent); }
    .status { min-height: 1.2em; color: var(--muted); }
    .status[data-type="error"] { color: #c63b2b; }
    .status[data-type="ok"] { color: var(--done); }
  </style>
</head>
<body>
  <header>
    <h1>HabitFlow</h1>
    <p>Today is <span id="date">{{DATE}}</span></p>
  </header>
  <main>
    <section class="cards">
      <div class="card"><div class="label">Total habits</div><div class="value" id="total">{{TOTAL}}</div></div>
      <div class="card"><div class="label">Completed today</div><div class="value done" id="completed">{{COMPLETED}}</div></div>
      <div class="card"><div class="label">In progress</div><div class="value warn" id="in-progress">{{IN_PROGRESS}}</div></div>
      <div class="card"><div class="label">Completion rate</div><div class="value" id="rate">{{RATE}}%</div></div>
    </section>

    <form id="create-form" class="card controls">
      <input name="name" placeholder="New habit" required />
      <input name="target_count" type="number" min="1" value="1" />
      <select name="frequency">
        <option value="daily">Daily</option>
        <option value="weekly">Weekly</option>
        <option value="monthly">Monthly</option>
      </select>
      <input name="color" type="color" value="#3B82F6" />
      <button class="primary" type="submit">Add habit</button>
    </form>

    <section class="controls">
      <input id="search" placeholder="Search habits..." />
      <select id="filter">
        <option value="all">All habits</option>
        <option value="completed">Completed</option>
        <option value="pending">Pending</option>
      </select>
      <select id="sort">
        <option value="name">Sort by name</option>
        <option value="date">Sort by date</option>
        <option value="progress">Sort by progress</option>
      </select>
    </section>

    <section id="habits"></section>

    <section class="cards">
      <div class="card"><div class="label">Current streak</div><div class="value" id="streak">0 days</div></div>
      <div class="card"><div class="label">Total completions</div><div class="value" id="completions">0</div></div>
      <div class="card"><div class="label">This week</div><div class="value" id="week-total">0 / 0</div><div class="label" id="week-rate">0% completed</div></div>
    </section>

    <section class="cards">
      <div class="card">
        <div class="row">
          <strong>Habit completion</strong>
          <select id="range">
            <option value="week">Last 7 days</option>
            <option value="month">Last 30 days</option>
          </select>
        </div>
        <svg id="chart" viewBox="0 0 600 220" role="img" aria-label="Completion chart"></svg>
      </div>
      <div class="card">
        <strong>Weekly overview</strong>
        <div id="week"></div>
      </div>
    </section>

    <div class="status" id="status"></div>
  </main>
  <script>
    const $ = (id) => document.getElementById(id);
    const statusEl = $('status');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const api = async (path, options = {}) => {
      const response = await fetch(path, {
        headers: { 'Content-Type': 'application/json' },
        ...options
      });
      if (!response.ok) {
        throw new Error(await response.text() || response.statusText);
      }
      return response.status === 204 ? null : response.json();
    };

    const escapeHtml = (value) => String(value ?? '').replace(/[&<>"']/g, (ch) => ({
      '&': '&amp;',
      '<': '&lt;',
      '>': '&gt;',
      '"': '&quot;',
      "'": '&#39;'
    })[ch]);

    const renderHabits = (cards) => {
      const root = $('habits');
      if (!cards.length) {
        root.innerHTML = '<p class="label">No habits yet.</p>';
        return;
      }
      root.innerHTML = cards.map((card) => `
        <div class="card habit" data-id="${escapeHtml(card.id)}">
          <h3><span class="dot" style="background:${escapeHtml(card.color)}"></span>${escapeHtml(card.name)}</h3>
          <div class="label">${escapeHtml(card.frequency)}${card.description ? ' · ' + escapeHtml(card.description) : ''}</div>
          <div class="bar"><span style="width:${card.progress_percentage}%"></span></div>
          <div class="row">
            <span>${card.today_count} / ${card.target_count}</span>
            <span>
              <button data-step="decrement">−</button>
              <button data-step="increment">+</button>
              <button data-delete>Delete</button>
            </span>
          </div>
          <div class="recent">
            ${card.recent.map((d) => `<span title="${d.date}" class="${d.completed ? 'done' : ''} ${d.is_today ? 'today' : ''}"></span>`).join('')}
          </div>
        </div>`).join('');
    };

    const renderChart = (points) => {
      const width = 600;
      const height = 220;
      const pad = 28;
      const max = Math.max(1, ...points.map((p) => p.total));
      const slot = (width - pad * 2) / points.length;
      const barWidth = Math.max(4, slot * 0.6);
      const every = points.length > 10 ? 5 : 1;
      $('chart').innerHTML = points.map((p, i) => {
        const h = ((height - pad * 2) * p.completed) / max;
        const x = pad + i * slot + (slot - barWidth) / 2;
        const label = i % every === 0
          ? `<text class="chart-label" x="${x + barWidth / 2}" y="${height - 8}" text-anchor="middle">${p.label}</text>`
          : '';
        return `<rect class="chart-bar" x="${x}" y="${height - pad - h}" width="${barWidth}" height="${h}" rx="3"><title>${p.date}: ${p.percentage}%</title></rect>${label}`;
      }).join('');
    };

    const renderStats = (stats) => {
      $('total').textContent = stats.today.total;
      $('completed').textContent = stats.today.completed;
      $('in-progress').textContent = stats.today.in_progress;
      $('rate').textContent = `${stats.completion_rate}%`;
      $('streak').textContent = `${stats.current_streak} days`;
      $('completions').textContent = stats.total_completions;
      $('week-total').textContent = `${stats.weekly_overview.completed} / ${stats.weekly_overview.possible}`;
      $('week-rate').textContent = `${stats.weekly_overview.percentage}% completed`;
      $('week').innerHTML = stats.weekly_overview.days.map((d) => `
        <div class="week-day ${d.is_today ? 'today' : ''}"><span>${d.day}</span><span>${d.completed} / ${d.total}</span></div>`).join('');
      renderChart(stats.rollup);
    };

    const refresh = async () => {
      const params = new URLSearchParams({
        filter: $('filter').value,
        sort_by: $('sort').value,
        search: $('search').value
      });
      try {
        const [cards, stats] = await Promise.all([
          api(`/api/habits?${params}`),
          api(`/api/stats?range=${$('range').value}`)
        ]);
        renderHabits(cards);
        renderStats(stats);
      } catch (err) {
        setStatus(err.message, 'error');
      }
    };

    $('habits').addEventListener('click', async (event) => {
      const habit = event.target.closest('.habit');
      if (!habit) {
        return;
      }
      const id = habit.dataset.id;
      try {
        if (event.target.dataset.step) {
          const result = await api(`/api/habits/${id}/${event.target.dataset.step}`, { method: 'POST' });
          if (result.just_completed) {
            setStatus('Daily goal reached!', 'ok');
          }
        } else if ('delete' in event.target.dataset) {
          await api(`/api/habits/${id}`, { method: 'DELETE' });
          setStatus('Habit deleted.', 'ok');
        } else {
          return;
        }
        await refresh();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    $('create-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      try {
        await api('/api/habits', {
          method: 'POST',
          body: JSON.stringify({
            name: form.get('name'),
            target_count: parseInt(form.get('target_count'), 10) || 1,
            frequency: form.get('frequency'),
            color: form.get('color')
          })
        });
        event.target.reset();
        setStatus('Habit created.', 'ok');
        await refresh();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    ['filter', 'sort', 'range'].forEach((id) => $(id).addEventListener('change', refresh));
    $('search').addEventListener('input', refresh);
    refresh();
  </script>
</body>
</html>
"##;

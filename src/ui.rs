use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::collections::HashMap;
use std::io;

use monthly_budget::{
    amount, compute, format_brl, BarMeasure, BudgetInputs, BudgetReport, BudgetResult,
    PersonField, PersonId, PersonRegistry, Scenario, BAR_TITLE, PIE_TITLE,
};

// ============================================================================
// FORM MODEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Income,
    Fixed,
    Personal,
    Food,
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Section::Income => "💰 Ganhos Mensais",
            Section::Fixed => "🏠 Contas Fixas",
            Section::Personal => "👤 Contas Pessoais",
            Section::Food => "🍽 Alimentação e Transporte",
        }
    }
}

/// The fixed (non-person) inputs of the form, in page order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Salary,
    BolsaFamilia,
    InternetReceived,
    RentCurrent,
    RentNew,
    InternetCost,
    Electricity,
    Groceries,
    Delivery,
    Mobility,
}

impl FormField {
    pub const ALL: [FormField; 10] = [
        FormField::Salary,
        FormField::BolsaFamilia,
        FormField::InternetReceived,
        FormField::RentCurrent,
        FormField::RentNew,
        FormField::InternetCost,
        FormField::Electricity,
        FormField::Groceries,
        FormField::Delivery,
        FormField::Mobility,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Salary => "Salário Bruto",
            FormField::BolsaFamilia => "Bolsa Família",
            FormField::InternetReceived => "Divisão Internet (recebido)",
            FormField::RentCurrent => "Aluguel (atual)",
            FormField::RentNew => "Aluguel (novo)",
            FormField::InternetCost => "Internet (custo cheio)",
            FormField::Electricity => "Luz",
            FormField::Groceries => "Supermercado",
            FormField::Delivery => "Delivery/Restaurantes",
            FormField::Mobility => "Mobilidade",
        }
    }

    pub fn section(&self) -> Section {
        match self {
            FormField::Salary | FormField::BolsaFamilia | FormField::InternetReceived => {
                Section::Income
            }
            FormField::RentCurrent
            | FormField::RentNew
            | FormField::InternetCost
            | FormField::Electricity => Section::Fixed,
            FormField::Groceries | FormField::Delivery | FormField::Mobility => Section::Food,
        }
    }

    fn fields_in(section: Section) -> impl Iterator<Item = FormField> {
        Self::ALL.into_iter().filter(move |f| f.section() == section)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonColumn {
    Name,
    TotalDebt,
    MonthlyPayment,
}

impl PersonColumn {
    pub const ALL: [PersonColumn; 3] = [
        PersonColumn::Name,
        PersonColumn::TotalDebt,
        PersonColumn::MonthlyPayment,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PersonColumn::Name => "Nome",
            PersonColumn::TotalDebt => "Dívida Total",
            PersonColumn::MonthlyPayment => "Pagamento Mensal",
        }
    }

    fn edit(&self, raw: &str) -> PersonField {
        match self {
            PersonColumn::Name => PersonField::Name(raw.to_string()),
            PersonColumn::TotalDebt => PersonField::TotalDebt(amount::parse(raw)),
            PersonColumn::MonthlyPayment => PersonField::MonthlyPayment(amount::parse(raw)),
        }
    }
}

/// Something the cursor can sit on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    Field(FormField),
    Person(PersonId, PersonColumn),
}

fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, ',' | '.' | '-')
}

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    /// Raw text typed into each fixed field
    pub fields: HashMap<FormField, String>,
    pub registry: PersonRegistry,
    /// Raw text typed into each person cell
    pub person_text: HashMap<(PersonId, PersonColumn), String>,
    pub selected: usize,
    pub result: BudgetResult,
    pub report: BudgetReport,
}

impl App {
    pub fn new() -> Self {
        let fields = FormField::ALL
            .into_iter()
            .map(|f| (f, String::new()))
            .collect();
        let result = compute(&BudgetInputs::default());
        let report = BudgetReport::from_result(&result);

        App {
            fields,
            registry: PersonRegistry::new(),
            person_text: HashMap::new(),
            selected: 0,
            result,
            report,
        }
    }

    /// Every focusable cell in page order: income, fixed, persons, food
    pub fn focus_items(&self) -> Vec<Focus> {
        let mut items: Vec<Focus> = FormField::fields_in(Section::Income)
            .chain(FormField::fields_in(Section::Fixed))
            .map(Focus::Field)
            .collect();

        for person in self.registry.entries() {
            for column in PersonColumn::ALL {
                items.push(Focus::Person(person.id, column));
            }
        }

        items.extend(FormField::fields_in(Section::Food).map(Focus::Field));
        items
    }

    pub fn focused(&self) -> Option<Focus> {
        self.focus_items().get(self.selected).copied()
    }

    pub fn next(&mut self) {
        let len = self.focus_items().len();
        self.selected = if self.selected + 1 >= len { 0 } else { self.selected + 1 };
    }

    pub fn previous(&mut self) {
        let len = self.focus_items().len();
        self.selected = if self.selected == 0 { len - 1 } else { self.selected - 1 };
    }

    fn focus_on(&mut self, target: Focus) {
        if let Some(index) = self.focus_items().iter().position(|f| *f == target) {
            self.selected = index;
        }
    }

    /// "+ Adicionar pessoa": new row, cursor on its name
    pub fn add_person(&mut self) -> PersonId {
        let id = self.registry.add_person();
        for column in PersonColumn::ALL {
            self.person_text.insert((id, column), String::new());
        }
        self.focus_on(Focus::Person(id, PersonColumn::Name));
        id
    }

    /// "❌" on the row under the cursor. Does nothing when the cursor is not on a person.
    pub fn delete_selected_person(&mut self) -> bool {
        let Some(Focus::Person(id, _)) = self.focused() else {
            return false;
        };

        let removed = self.registry.remove_person(id);
        self.person_text.retain(|(person_id, _), _| *person_id != id);

        let len = self.focus_items().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        removed
    }

    pub fn input_char(&mut self, c: char) {
        match self.focused() {
            Some(Focus::Field(field)) if is_numeric_char(c) => {
                self.fields.entry(field).or_default().push(c);
            }
            Some(Focus::Person(id, column)) => {
                if column != PersonColumn::Name && !is_numeric_char(c) {
                    return;
                }
                let text = self.person_text.entry((id, column)).or_default();
                text.push(c);
                let edit = column.edit(text);
                self.registry.update_field(id, edit);
            }
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focused() {
            Some(Focus::Field(field)) => {
                self.fields.entry(field).or_default().pop();
            }
            Some(Focus::Person(id, column)) => {
                let text = self.person_text.entry((id, column)).or_default();
                text.pop();
                let edit = column.edit(text);
                self.registry.update_field(id, edit);
            }
            None => {}
        }
    }

    fn field_value(&self, field: FormField) -> f64 {
        self.fields.get(&field).map(|s| amount::parse(s)).unwrap_or(0.0)
    }

    /// Everything currently on screen, as calculator input
    pub fn snapshot(&self) -> BudgetInputs {
        BudgetInputs {
            salary: self.field_value(FormField::Salary),
            bolsa_familia: self.field_value(FormField::BolsaFamilia),
            internet_received: self.field_value(FormField::InternetReceived),
            rent_current: self.field_value(FormField::RentCurrent),
            rent_new: self.field_value(FormField::RentNew),
            internet_cost: self.field_value(FormField::InternetCost),
            electricity: self.field_value(FormField::Electricity),
            personal_payments: self.registry.list_payments(),
            groceries: self.field_value(FormField::Groceries),
            delivery: self.field_value(FormField::Delivery),
            mobility: self.field_value(FormField::Mobility),
        }
    }

    /// "Calcular"
    pub fn recalculate(&mut self) {
        self.result = compute(&self.snapshot());
        self.report = BudgetReport::from_result(&self.result);
    }

    /// Returns false when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('c') if ctrl => return false,
            KeyCode::Char('a') if ctrl => {
                self.add_person();
            }
            KeyCode::Char('d') if ctrl => {
                self.delete_selected_person();
            }
            KeyCode::Enter => self.recalculate(),
            KeyCode::Down | KeyCode::Tab => self.next(),
            KeyCode::Up | KeyCode::BackTab => self.previous(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(c) if !ctrl => self.input_char(c),
            _ => {}
        }
        true
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Form + results
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0]);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    render_form(f, content[0], app);

    let results = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(content[1]);

    render_report(f, results[0], app);
    render_charts(f, results[1], app);

    render_status_bar(f, chunks[2]);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(Span::styled(
        " ORGANIZADOR FINANCEIRO MENSAL",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn cell_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Yellow)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

fn section_title(section: Section) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {}", section.title()),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focused();
    let mut lines: Vec<Line> = Vec::new();

    let field_line = |field: FormField| {
        let is_focused = focused == Some(Focus::Field(field));
        let text = app.fields.get(&field).map(String::as_str).unwrap_or("");
        Line::from(vec![
            Span::raw(if is_focused { " → " } else { "   " }),
            Span::raw(format!("{:<28}", format!("{}:", field.label()))),
            Span::styled(format!(" {:<12}", text), cell_style(is_focused)),
        ])
    };

    for section in [Section::Income, Section::Fixed] {
        lines.push(section_title(section));
        lines.extend(FormField::fields_in(section).map(&field_line));
        lines.push(Line::from(""));
    }

    lines.push(section_title(Section::Personal));
    if app.registry.is_empty() {
        lines.push(Line::from(Span::styled(
            "   (Ctrl+A para adicionar pessoa)",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
    for person in app.registry.entries() {
        let mut spans = vec![Span::raw(format!("   #{:<3}", person.id))];
        for column in PersonColumn::ALL {
            let is_focused = focused == Some(Focus::Person(person.id, column));
            let text = app
                .person_text
                .get(&(person.id, column))
                .map(String::as_str)
                .unwrap_or("");
            spans.push(Span::raw(format!(" {}: ", column.label())));
            spans.push(Span::styled(format!("{:<10}", text), cell_style(is_focused)));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(""));

    lines.push(section_title(Section::Food));
    lines.extend(FormField::fields_in(Section::Food).map(&field_line));

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Formulário "),
    );

    f.render_widget(form, area);
}

fn amount_color(value: f64) -> Color {
    if value < 0.0 {
        Color::Red
    } else {
        Color::Green
    }
}

fn render_report(f: &mut Frame, area: Rect, app: &App) {
    let report = &app.report;
    let mut lines: Vec<Line> = [
        &report.income,
        &report.fixed_current,
        &report.fixed_new,
        &report.personal,
        &report.food,
    ]
    .iter()
    .map(|line| Line::from(format!(" ➡️ {}", line.text)))
    .collect();

    for balance in [&report.balance_current, &report.balance_new] {
        lines.push(Line::from(Span::styled(
            format!(" 💰 {}", balance.text),
            Style::default()
                .fg(amount_color(balance.amount))
                .add_modifier(Modifier::BOLD),
        )));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(" Totais "),
    );

    f.render_widget(panel, area);
}

/// Horizontal text bar scaled against `max`
fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let filled = ((value.abs() / max) * width as f64).round() as usize;
    "█".repeat(filled.min(width))
}

fn hex_color(hex: &str) -> Color {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(255)
    };
    Color::Rgb(channel(1..3), channel(3..5), channel(5..7))
}

fn render_charts(f: &mut Frame, area: Rect, app: &App) {
    const WIDTH: usize = 20;
    let result = &app.result;
    let mut lines: Vec<Line> = vec![Line::from(Span::styled(
        format!(" {}", PIE_TITLE),
        Style::default().add_modifier(Modifier::BOLD),
    ))];

    let pie_total: f64 = result.pie_series.iter().map(|s| s.value).sum();
    let pie_max = result.pie_series.iter().map(|s| s.value.abs()).fold(0.0, f64::max);
    for slice in &result.pie_series {
        let share = if pie_total > 0.0 { slice.value / pie_total * 100.0 } else { 0.0 };
        lines.push(Line::from(vec![
            Span::raw(format!(" {:<13}", slice.label)),
            Span::styled(format!("{:<20}", bar(slice.value, pie_max, WIDTH)), Style::default().fg(hex_color(&slice.color))),
            Span::raw(format!(" {:>5.1}%", share)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(" {}", BAR_TITLE),
        Style::default().add_modifier(Modifier::BOLD),
    )));

    let bar_max = result
        .bar_series
        .iter()
        .flat_map(|g| BarMeasure::ALL.map(|m| g.value(m).abs()))
        .fold(0.0, f64::max);
    for group in &result.bar_series {
        lines.push(Line::from(format!(" {}", group.label)));
        for measure in BarMeasure::ALL {
            let value = group.value(measure);
            lines.push(Line::from(vec![
                Span::raw(format!("   {:<9}", measure.label())),
                Span::styled(format!("{:<20}", bar(value, bar_max, WIDTH)), Style::default().fg(hex_color(measure.color()))),
                Span::raw(format!(" {}", format_brl(value))),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            " Diferença Novo - Atual: {}",
            format_brl(result.balance(Scenario::New) - result.balance(Scenario::Current))
        ),
        Style::default().fg(Color::DarkGray),
    )));

    let charts = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" 📊 Gráficos "),
    );

    f.render_widget(charts, area);
}

fn render_status_bar(f: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let status_spans = vec![
        Span::raw(" "),
        key("↑/↓"),
        Span::raw(" Campo | "),
        key("Enter"),
        Span::raw(" Calcular | "),
        key("Ctrl+A"),
        Span::raw(" Adicionar pessoa | "),
        key("Ctrl+D"),
        Span::raw(" Excluir pessoa | "),
        Span::styled("Esc", Style::default().fg(Color::Red)),
        Span::raw(" Sair"),
    ];

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

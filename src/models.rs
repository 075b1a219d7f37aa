use ratatui::style::Color;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Admin entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccountKind {
    #[default]
    Receita,
    Deducao,
    Custo,
    Despesa,
}

impl AccountKind {
    pub const ALL: [AccountKind; 4] = [
        AccountKind::Receita,
        AccountKind::Deducao,
        AccountKind::Custo,
        AccountKind::Despesa,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::Receita => "Receita",
            AccountKind::Deducao => "Dedução",
            AccountKind::Custo => "Custo",
            AccountKind::Despesa => "Despesa",
        }
    }
}

/// Chart-of-accounts entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub group: String,
    pub active: bool,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            kind: AccountKind::default(),
            group: String::new(),
            active: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub legal_name: String,
    pub trade_name: String,
    pub cnpj: String,
    pub email: String,
    pub active: bool,
}

impl Default for Company {
    fn default() -> Self {
        Self {
            legal_name: String::new(),
            trade_name: String::new(),
            cnpj: String::new(),
            email: String::new(),
            active: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Analista,
    #[default]
    Visualizador,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Analista, Role::Visualizador];

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrador",
            Role::Analista => "Analista",
            Role::Visualizador => "Visualizador",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
}

impl Default for User {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            role: Role::default(),
            active: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Display records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsightType {
    Positive,
    Negative,
    Warning,
    Info,
}

impl InsightType {
    pub fn color(&self) -> Color {
        match self {
            InsightType::Positive => Color::Rgb(80, 220, 100),
            InsightType::Negative => Color::Red,
            InsightType::Warning => Color::Yellow,
            InsightType::Info => Color::Cyan,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            InsightType::Positive => "▲",
            InsightType::Negative => "▼",
            InsightType::Warning => "!",
            InsightType::Info => "i",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InsightType::Positive => "Positivo",
            InsightType::Negative => "Negativo",
            InsightType::Warning => "Atenção",
            InsightType::Info => "Informativo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ImpactLevel {
    High,
    Medium,
    Low,
}

impl ImpactLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ImpactLevel::High => "Alto",
            ImpactLevel::Medium => "Médio",
            ImpactLevel::Low => "Baixo",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            ImpactLevel::High => Color::Red,
            ImpactLevel::Medium => Color::Yellow,
            ImpactLevel::Low => Color::DarkGray,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub kind: InsightType,
    pub impact: ImpactLevel,
    pub title: &'static str,
    pub description: &'static str,
    pub value: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultCategory {
    Receita,
    Custo,
    Despesa,
    Resultado,
}

impl ResultCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ResultCategory::Receita => "Receita",
            ResultCategory::Custo => "Custo",
            ResultCategory::Despesa => "Despesa",
            ResultCategory::Resultado => "Resultado",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            ResultCategory::Receita => Color::Rgb(80, 220, 100),
            ResultCategory::Custo => Color::Rgb(255, 160, 80),
            ResultCategory::Despesa => Color::Red,
            ResultCategory::Resultado => Color::Cyan,
        }
    }

    /// Higher is better for revenue and results, worse for costs and expenses.
    pub fn growth_is_good(&self) -> bool {
        matches!(self, ResultCategory::Receita | ResultCategory::Resultado)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultItem {
    pub category: ResultCategory,
    pub label: &'static str,
    pub value: f64,
    pub variation: f64,
}

/// Operating expense buckets used by the composition chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExpenseCategory {
    Pessoal,
    Marketing,
    Administrativo,
    Tecnologia,
    Logistica,
    Outros,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 6] = [
        ExpenseCategory::Pessoal,
        ExpenseCategory::Marketing,
        ExpenseCategory::Administrativo,
        ExpenseCategory::Tecnologia,
        ExpenseCategory::Logistica,
        ExpenseCategory::Outros,
    ];

    /// Fixed share of operating expenses. Shares sum to 1.0.
    pub fn share(&self) -> f64 {
        match self {
            ExpenseCategory::Pessoal => 0.42,
            ExpenseCategory::Marketing => 0.18,
            ExpenseCategory::Administrativo => 0.15,
            ExpenseCategory::Tecnologia => 0.12,
            ExpenseCategory::Logistica => 0.08,
            ExpenseCategory::Outros => 0.05,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Pessoal => "Pessoal",
            ExpenseCategory::Marketing => "Marketing",
            ExpenseCategory::Administrativo => "Administrativo",
            ExpenseCategory::Tecnologia => "Tecnologia",
            ExpenseCategory::Logistica => "Logística",
            ExpenseCategory::Outros => "Outros",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            ExpenseCategory::Pessoal => Color::Rgb(255, 179, 186),
            ExpenseCategory::Marketing => Color::Rgb(255, 200, 162),
            ExpenseCategory::Administrativo => Color::Rgb(255, 224, 163),
            ExpenseCategory::Tecnologia => Color::Rgb(186, 225, 255),
            ExpenseCategory::Logistica => Color::Rgb(196, 183, 255),
            ExpenseCategory::Outros => Color::Rgb(201, 255, 203),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_shares_sum_to_one() {
        let total: f64 = ExpenseCategory::ALL.iter().map(|c| c.share()).sum();
        assert!((total - 1.0).abs() < 1e-9, "shares sum to {total}");
    }

    #[test]
    fn test_new_entities_default_active() {
        assert!(Account::default().active);
        assert!(Company::default().active);
        assert!(User::default().active);
        assert_eq!(User::default().role, Role::Visualizador);
    }

    #[test]
    fn test_impact_ordering() {
        let mut levels = vec![ImpactLevel::Low, ImpactLevel::High, ImpactLevel::Medium];
        levels.sort();
        assert_eq!(levels, vec![ImpactLevel::High, ImpactLevel::Medium, ImpactLevel::Low]);
    }
}

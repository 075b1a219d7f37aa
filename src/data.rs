//! Sample reporting dataset. All figures are in the reporting currency and are
//! never mutated at runtime.

use crate::models::{
    Account, AccountKind, Company, ImpactLevel, Insight, InsightType, ResultCategory, ResultItem,
    Role, User,
};
use crate::period::MonthToken;

/// Deductions (taxes on sales, returns) as a share of gross revenue.
pub const DEDUCTIONS_RATIO: f64 = 0.18;
/// Cost of goods sold (CMV) as a share of gross revenue.
pub const COGS_RATIO: f64 = 0.6;

/// The three base figures reported per month.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonthlyFigures {
    pub receita: f64,
    pub despesas: f64,
    pub lucro: f64,
}

impl MonthlyFigures {
    pub fn add(self, other: MonthlyFigures) -> MonthlyFigures {
        MonthlyFigures {
            receita: self.receita + other.receita,
            despesas: self.despesas + other.despesas,
            lucro: self.lucro + other.lucro,
        }
    }
}

// (receita, despesas operacionais, lucro líquido), janeiro-2023 .. dezembro-2024
const MONTHLY: [(f64, f64, f64); 24] = [
    (900_000.0, 110_000.0, 88_000.0),
    (850_000.0, 105_000.0, 82_000.0),
    (950_000.0, 112_000.0, 97_000.0),
    (1_000_000.0, 118_000.0, 102_000.0),
    (1_050_000.0, 121_000.0, 110_000.0),
    (1_000_000.0, 117_000.0, 103_000.0),
    (1_100_000.0, 126_000.0, 116_000.0),
    (1_150_000.0, 130_000.0, 123_000.0),
    (1_100_000.0, 127_000.0, 115_000.0),
    (1_200_000.0, 135_000.0, 129_000.0),
    (1_250_000.0, 140_000.0, 135_000.0),
    (1_350_000.0, 150_000.0, 147_000.0),
    (1_000_000.0, 118_000.0, 102_000.0),
    (950_000.0, 113_000.0, 96_000.0),
    (1_050_000.0, 122_000.0, 109_000.0),
    (1_100_000.0, 126_000.0, 116_000.0),
    (1_150_000.0, 131_000.0, 122_000.0),
    (1_100_000.0, 128_000.0, 114_000.0),
    (1_200_000.0, 136_000.0, 128_000.0),
    (1_250_000.0, 140_000.0, 135_000.0),
    (1_200_000.0, 137_000.0, 127_000.0),
    (1_300_000.0, 145_000.0, 141_000.0),
    (1_350_000.0, 150_000.0, 147_000.0),
    (1_450_000.0, 158_000.0, 161_000.0),
];

pub fn monthly(month: MonthToken) -> MonthlyFigures {
    let (receita, despesas, lucro) = MONTHLY[month.index()];
    MonthlyFigures {
        receita,
        despesas,
        lucro,
    }
}

/// Sum of the base figures over `months`.
pub fn aggregate(months: &[MonthToken]) -> MonthlyFigures {
    months
        .iter()
        .map(|m| monthly(*m))
        .fold(MonthlyFigures::default(), MonthlyFigures::add)
}

pub const INSIGHTS: &[Insight] = &[
    Insight {
        kind: InsightType::Positive,
        impact: ImpactLevel::High,
        title: "Receita em crescimento",
        description: "A receita bruta de dezembro superou o mesmo mês do ano anterior, puxada pelo canal de vendas diretas.",
        value: Some("+7,4%"),
    },
    Insight {
        kind: InsightType::Warning,
        impact: ImpactLevel::Medium,
        title: "Despesas operacionais acima da meta",
        description: "As despesas com pessoal cresceram mais rápido que a receita nos últimos três meses.",
        value: Some("+5,3%"),
    },
    Insight {
        kind: InsightType::Positive,
        impact: ImpactLevel::Medium,
        title: "Margem líquida estável",
        description: "A margem líquida se manteve acima de 10% em todos os meses do ano.",
        value: Some("11,1%"),
    },
    Insight {
        kind: InsightType::Negative,
        impact: ImpactLevel::High,
        title: "CMV pressionado",
        description: "O custo das mercadorias vendidas segue em 60% da receita bruta; renegociar contratos de fornecimento pode liberar margem.",
        value: Some("60%"),
    },
    Insight {
        kind: InsightType::Info,
        impact: ImpactLevel::Low,
        title: "Sazonalidade de fim de ano",
        description: "Novembro e dezembro concentram a maior receita do ano, padrão repetido em 2023 e 2024.",
        value: None,
    },
    Insight {
        kind: InsightType::Negative,
        impact: ImpactLevel::Low,
        title: "Queda em fevereiro",
        description: "Fevereiro registrou a menor receita do ano, abaixo de janeiro em ambos os exercícios.",
        value: Some("-5,0%"),
    },
];

pub const RESULTS: &[ResultItem] = &[
    ResultItem {
        category: ResultCategory::Receita,
        label: "Vendas de produtos",
        value: 1_015_000.0,
        variation: 8.1,
    },
    ResultItem {
        category: ResultCategory::Receita,
        label: "Prestação de serviços",
        value: 435_000.0,
        variation: 6.2,
    },
    ResultItem {
        category: ResultCategory::Custo,
        label: "Custo das mercadorias vendidas",
        value: 870_000.0,
        variation: 7.4,
    },
    ResultItem {
        category: ResultCategory::Despesa,
        label: "Despesas com pessoal",
        value: 66_360.0,
        variation: 5.3,
    },
    ResultItem {
        category: ResultCategory::Despesa,
        label: "Marketing",
        value: 28_440.0,
        variation: -2.1,
    },
    ResultItem {
        category: ResultCategory::Resultado,
        label: "Lucro líquido",
        value: 161_000.0,
        variation: 9.5,
    },
];

// ---------------------------------------------------------------------------
// Admin seed records
// ---------------------------------------------------------------------------

pub fn sample_accounts() -> Vec<Account> {
    let rows: &[(&str, &str, AccountKind, &str)] = &[
        ("3.1.01", "Venda de produtos", AccountKind::Receita, "Receita Bruta"),
        ("3.1.02", "Prestação de serviços", AccountKind::Receita, "Receita Bruta"),
        ("3.2.01", "ICMS sobre vendas", AccountKind::Deducao, "Deduções"),
        ("3.2.02", "Devoluções", AccountKind::Deducao, "Deduções"),
        ("4.1.01", "Custo das mercadorias vendidas", AccountKind::Custo, "CMV"),
        ("5.1.01", "Salários e encargos", AccountKind::Despesa, "Despesas Operacionais"),
        ("5.1.02", "Marketing e publicidade", AccountKind::Despesa, "Despesas Operacionais"),
    ];
    rows.iter()
        .map(|(code, name, kind, group)| Account {
            code: code.to_string(),
            name: name.to_string(),
            kind: *kind,
            group: group.to_string(),
            active: true,
        })
        .collect()
}

pub fn sample_companies() -> Vec<Company> {
    vec![
        Company {
            legal_name: "Comercial Horizonte Ltda".to_string(),
            trade_name: "Horizonte".to_string(),
            cnpj: "11.222.333/0001-44".to_string(),
            email: "financeiro@horizonte.com.br".to_string(),
            active: true,
        },
        Company {
            legal_name: "Horizonte Serviços S.A.".to_string(),
            trade_name: "Horizonte Serviços".to_string(),
            cnpj: "22.333.444/0001-55".to_string(),
            email: String::new(),
            active: false,
        },
    ]
}

pub fn sample_users() -> Vec<User> {
    vec![
        User {
            name: "Mariana Costa".to_string(),
            email: "mariana.costa@horizonte.com.br".to_string(),
            role: Role::Admin,
            active: true,
        },
        User {
            name: "Rafael Lima".to_string(),
            email: "rafael.lima@horizonte.com.br".to_string(),
            role: Role::Analista,
            active: true,
        },
        User {
            name: "Paula Mendes".to_string(),
            email: "paula.mendes@horizonte.com.br".to_string(),
            role: Role::Visualizador,
            active: false,
        },
    ]
}

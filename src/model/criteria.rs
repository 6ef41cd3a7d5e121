//! Static criterion tables, one per form kind.
//!
//! Every table sums to 10 points, which is also the score scale, but the
//! calculator never relies on that: it always divides by the table's own
//! total.

use super::FormKind;

/// One scored dimension of an evaluation form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriterionDefinition {
    pub id: &'static str,
    pub description: &'static str,
    /// Printed in the table; does not enter the formula.
    pub weight: f64,
    pub max_score: f64,
}

const fn criterion(
    id: &'static str,
    description: &'static str,
    max_score: f64,
) -> CriterionDefinition {
    CriterionDefinition {
        id,
        description,
        weight: 1.0,
        max_score,
    }
}

pub const ANDAMENTO_CC: &[CriterionDefinition] = &[
    criterion("apresentacao", "Apresentação", 5.0),
    criterion("qualidade_conteudo", "Qualidade do Conteúdo", 3.0),
    criterion("relevancia_originalidade", "Relevância e Originalidade", 2.0),
];

pub const FINAL_CC: &[CriterionDefinition] = &[
    criterion("conteudo_apresentacao", "Conteúdo da Apresentação", 2.0),
    criterion(
        "utilizacao_tempo_sintese",
        "Utilização do Tempo e Poder de Síntese",
        1.0,
    ),
    criterion("estrutura_trabalho", "Estrutura do Trabalho", 1.0),
    criterion(
        "relevancia_qualidade_conteudo",
        "Relevância, Originalidade e Qualidade do Conteúdo do Texto",
        3.0,
    ),
    criterion(
        "grau_conhecimento",
        "Grau de Conhecimento Demonstrado no Trabalho Escrito",
        2.0,
    ),
    criterion(
        "adequacao_bibliografia",
        "Adequação da Bibliografia Apresentada",
        1.0,
    ),
];

pub const FINAL_SI: &[CriterionDefinition] = &[
    criterion("conteudo_apresentacao", "Conteúdo da Apresentação", 1.0),
    criterion(
        "dominio_recursos_didaticos",
        "Domínio dos Recursos Didáticos",
        1.0,
    ),
    criterion(
        "utilizacao_tempo_sintese",
        "Utilização do Tempo e Poder de Síntese",
        1.0,
    ),
    criterion("estrutura_trabalho", "Estrutura do Trabalho", 1.0),
    criterion(
        "relevancia_qualidade_conteudo",
        "Relevância, Originalidade e Qualidade do Conteúdo do Texto",
        3.0,
    ),
    criterion(
        "grau_conhecimento",
        "Grau de Conhecimento Demonstrado no Trabalho Escrito",
        2.0,
    ),
    criterion(
        "adequacao_bibliografia",
        "Adequação da Bibliografia Apresentada",
        1.0,
    ),
];

pub const ATA_APRESENTACAO: &[CriterionDefinition] =
    &[criterion("nota_final", "Nota Final", 10.0)];

/// The criterion table for a form kind.
pub fn criteria_for(kind: FormKind) -> &'static [CriterionDefinition] {
    match kind {
        FormKind::AndamentoCc => ANDAMENTO_CC,
        FormKind::FinalCc => FINAL_CC,
        FormKind::FinalSi => FINAL_SI,
        FormKind::Ata => ATA_APRESENTACAO,
    }
}

/// Normalization denominator for a kind.
pub fn total_max_score(criteria: &[CriterionDefinition]) -> f64 {
    criteria.iter().map(|c| c.max_score).sum()
}

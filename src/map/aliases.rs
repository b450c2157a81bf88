use serde::{Deserialize, Serialize};

/// Ordered alias lists per logical field. Every header string a past
/// release of the spreadsheet has used must stay listed here, most
/// specific first, because resolution takes the first hit.
///
/// Overridable from the config file; the defaults cover every variant
/// seen in production so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasTable {
    pub title: Vec<String>,
    pub origin: Vec<String>,
    pub reported_by: Vec<String>,
    pub resolution_owner: Vec<String>,
    pub deadline: Vec<String>,
    pub opened_date: Vec<String>,
    pub closed_date: Vec<String>,
    /// Primary image column; tried first.
    pub image_primary: Vec<String>,
    /// Legacy image columns; consulted only when the primary group
    /// resolves to empty.
    pub image_secondary: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            title: owned(&[
                "Titulo da Não conformidade:",
                "Título da Não conformidade:",
                "Titulo da Não Conformidade:",
                "Título da Não Conformidade:",
                "Titulo da Não conformidade",
                "Título",
                "Titulo",
                "OBRA",
                "Obra",
            ]),
            origin: owned(&[
                "Origem da RNC, inserir apenas JOB.",
                "Origem da RNC",
                "Origem",
                "ORIGEM",
                "origem",
                "JOB",
            ]),
            reported_by: owned(&[
                "Responsável pela emissão do R.N.C.:",
                "Responsável pela emissão do RNC:",
                "Responsável pela emissão",
                "Responsável Apontamento",
                "Responsavel Apontamento",
                "Emissão",
                "Emissor",
            ]),
            resolution_owner: owned(&[
                "Responsável pela resolução do problema:",
                "Responsável pela resolução",
                "Responsável pela resolução do R.N.C.:",
                "Responsável Plano de Ação",
                "Responsavel Plano de Acao",
                "Resolução",
                "Responsável Resolução",
            ]),
            deadline: owned(&[
                "Prazo para conclusão da R.N.C.:",
                "Prazo para conclusão da RNC:",
                "Prazo para conclusão",
                "Prazo (dias)",
                "Prazo (Dias)",
                "Prazo",
                "PRAZO",
                "Dias",
                "DIAS",
            ]),
            opened_date: owned(&[
                "Data de emissão:",
                "Data de emissão",
                "Data Abertura",
                "Data de Abertura",
                "DATA ABERTURA",
                "Emissão",
                "Data Emissão",
            ]),
            closed_date: owned(&[
                "Data Conclusão",
                "Data de Conclusão",
                "DATA CONCLUSÃO",
                "Conclusão",
                "Data Fim",
            ]),
            image_primary: owned(&[
                "Insira até 3 imagens da Não Conformidade:",
                "Insira até 3 imagens da Não Conformidade",
                "Insira até 3 imagens",
                "Imagens da Não Conformidade",
            ]),
            image_secondary: owned(&[
                "Link da imagem para site",
                "Link da imagem",
                "Imagem",
                "Link Imagem",
                "URL Imagem",
                "Imagem URL",
            ]),
        }
    }
}

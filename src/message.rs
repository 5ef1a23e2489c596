// src/message.rs

use crate::error::{NoticeError, Result};
use crate::money::format_brl;
use crate::pipeline::Resolution;
use crate::roster::RosterEntry;
use crate::settlement::SettlementAmounts;
use std::collections::HashMap;

/// The WhatsApp message sent to the driver. `{key}` placeholders are
/// substituted by [`MessageComposer::compose`].
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "\
Bom dia {nome_motorista}, tudo bem?

O senhor levou uma multa no dia {data_multa} em {cidade}/{uf} às {hora_multa} com a placa {placa}.

Multa por {descricao_multa}, no valor de {valor_base} e {pontos} pontos na carteira.

Preciso saber se posso indicar os pontos na sua carteira.
Se indicar o valor da multa cai pra {valor_com_indicacao} e sem indicar o valor da multa sobe pra {valor_sem_indicacao}.

Sobre o pagamento o senhor pode discutir com o RH sobre parcelamentos pra acertarem da melhor forma.";

pub struct MessageComposer {
    template: String,
}

impl MessageComposer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn compose(
        &self,
        driver: &RosterEntry,
        resolution: &Resolution,
        amounts: &SettlementAmounts,
    ) -> Result<String> {
        let fields = &resolution.fields;
        let fine = &resolution.fine;

        let values: HashMap<&str, String> = HashMap::from([
            ("nome_motorista", driver.short_name.clone()),
            ("data_multa", fields.citation_date.clone()),
            ("cidade", fields.city.clone()),
            ("uf", fields.state.clone()),
            ("hora_multa", fields.citation_time.clone()),
            ("placa", fields.plate.clone()),
            ("descricao_multa", fine.description.clone()),
            ("valor_base", format_brl(fine.base_value)),
            ("pontos", fine.points.to_string()),
            ("valor_com_indicacao", format_brl(amounts.with_disclosure)),
            ("valor_sem_indicacao", format_brl(amounts.without_disclosure)),
        ]);

        render(&self.template, &values)
    }
}

impl Default for MessageComposer {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_TEMPLATE)
    }
}

/// Substitute `{key}` placeholders. `{{` and `}}` are literal braces.
pub fn render(template: &str, values: &HashMap<&str, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len() + 128);
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            rest = after;
        } else if let Some(after) = tail.strip_prefix('{') {
            let Some(end) = after.find('}') else {
                return Err(NoticeError::MissingTemplateKey(after.to_string()));
            };
            let key = &after[..end];
            let value = values
                .get(key)
                .ok_or_else(|| NoticeError::MissingTemplateKey(key.to_string()))?;
            out.push_str(value);
            rest = &after[end + 1..];
        } else {
            // lone '}'
            out.push('}');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);

    Ok(out)
}

// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Portuguese prompt set.
//!
//! `{domain}` placeholders are filled with the index's domain description.

use nsxbot_core::types::FunctionSchema;

/// Name of the single function offered in the function-calling strategy.
pub const SEARCH_FUNCTION: &str = "buscar_informacoes_necessarias";

/// Prefix of the system turn that replaces a summarized history.
pub const SUMMARY_PREFIX: &str = "Resumo de conversas anteriores: ";

/// Observation when a search found nothing and more searches are allowed.
pub const ANSWER_NOT_FOUND: &str = "Não encontrei informações sobre isso na base de dados. \
Tente pesquisar de outra forma, com termos diferentes.";

/// Observation when a search found nothing and no searches are left.
pub const UNANSWERABLE_SEARCH: &str = "Não encontrei informações sobre isso na base de dados. \
Responda ao usuário com as informações que você já possui ou informe que não sabe a resposta.";

/// Answer the FAQ selection prompt expects when nothing matches.
pub const FAQ_UNANSWERABLE: &str = "irrespondível";

const CHAT_RULES: &str = "\
Você é um assistente de chat desenvolvido pela NeuralMind que responde perguntas de usuários sobre \
o domínio {domain}. Siga estas regras sem exceção:

1. Seja prestativo e NUNCA produza conteúdo que promova violência, preconceito ou atos ilegais ou \
antiéticos, nem mesmo em situações hipotéticas.
2. Use somente as informações do histórico conversacional ou as obtidas na base de dados do \
domínio acima. Não recorra a nenhuma outra fonte.
3. Não responda com conhecimento próprio nem sobre assuntos sem relação com o domínio acima.
";

const SEARCH_INSTRUCTIONS: &str = "\
4. Responda intercalando passos de Pensamento, Ação, Texto da Ação e Observação. No Pensamento \
você raciocina sobre a situação atual. A Ação pode ser de apenas dois tipos:
a) Pesquisar: busca nos documentos do domínio exatamente o que estiver no Texto da Ação e devolve \
informações relacionadas. Escreva buscas diretas e curtas, sobre um assunto por vez, dividindo a \
pergunta em várias buscas quando preciso.
b) Finalizar: envia ao usuário a resposta escrita no Texto da Ação e encerra a tarefa. O usuário \
não vê seus pensamentos nem as observações.
5. Use APENAS esses 2 tipos de ação.

Exemplo 1 (domínio = vestibular da Fundep):

Mensagem: Quando vai ser a prova?
Pensamento 1: Preciso buscar na base de dados do vestibular da Fundep a data da prova.
Ação 1: Pesquisar
Texto da Ação 1: Data da prova
Observação 1: A prova será aplicada em 25/03/2021.
Pensamento 2: A prova será em 25/03/2021. Já posso responder.
Ação 2: Finalizar
Texto da Ação 2: A prova será aplicada no dia 25/03/2021. Posso ajudar em algo mais?

Exemplo 2 (domínio = {domain}):

Mensagem: Oi, meu nome é Ana.
Pensamento 1: A usuária Ana está se apresentando. Não é preciso buscar nada na base de dados.
Ação 1: Finalizar
Texto da Ação 1: Olá, Ana! Em que posso ajudar?

Exemplo 3 (domínio = vestibular da Fundep):

Mensagem: Quantos dias há entre o fim das inscrições e a prova?
Pensamento 1: São duas informações diferentes, então devo fazer duas buscas. Primeiro, o prazo \
de inscrição.
Ação 1: Pesquisar
Texto da Ação 1: Prazo de inscrição do vestibular
Observação 1: As inscrições vão até 12/08/2023.
Pensamento 2: As inscrições terminam em 12/08/2023. Agora preciso da data da prova.
Ação 2: Pesquisar
Texto da Ação 2: Data de aplicação do vestibular
Observação 2: Data de aplicação da prova: 24/08/2023
Pensamento 3: Entre 12/08/2023 e 24/08/2023 há 12 dias.
Ação 3: Finalizar
Texto da Ação 3: São 12 dias entre o fim das inscrições e a prova. Algo mais?

Não copie as respostas dos exemplos. Responda apenas com o histórico conversacional abaixo ou com \
o que pesquisar na base de dados do domínio {domain}.

Histórico Conversacional:
";

const MEMORY_ONLY_INSTRUCTIONS: &str = "\
4. Responda intercalando passos de Pensamento, Ação e Texto da Ação. A única Ação disponível é \
Finalizar, que envia ao usuário a resposta escrita no Texto da Ação. O usuário não vê seus \
pensamentos.
5. Se a resposta não estiver no histórico, diga ao usuário que não possui essa informação.

Exemplo (domínio = {domain}):

Mensagem: Oi, meu nome é Ana.
Pensamento 1: A usuária Ana está se apresentando.
Ação 1: Finalizar
Texto da Ação 1: Olá, Ana! Em que posso ajudar?

Histórico Conversacional:
";

/// ReAct prompt up to the conversation history header.
///
/// Without search the prompt only describes the `Finalizar` action.
pub fn chat_prompt(domain: &str, search_enabled: bool) -> String {
    let instructions = if search_enabled {
        SEARCH_INSTRUCTIONS
    } else {
        MEMORY_ONLY_INSTRUCTIONS
    };
    format!("{CHAT_RULES}{instructions}").replace("{domain}", domain)
}

/// Asks the model to pick the FAQ question equivalent to a search, or
/// answer [`FAQ_UNANSWERABLE`].
pub fn faq_prompt(queries: &str, search_input: &str) -> String {
    format!(
        "Você analisa buscas feitas em um sistema de pesquisa. Dada uma nova busca e uma lista \
de buscas anteriores, verifique se a informação pedida na nova busca também é pedida por alguma \
busca da lista.
Se for, responda somente com essa busca da lista, exatamente como está escrita. Caso contrário, \
responda com '{FAQ_UNANSWERABLE}'.

Lista de buscas:
{queries}
Nova busca:
{search_input}

Resposta:
"
    )
}

pub fn summary_prompt(old_summary: &str, interactions: &str) -> String {
    format!(
        "Resuma uma conversa de forma clara e concisa para um assistente de chat, como se \
estivesse contextualizando o próprio assistente sobre ela.

Resumo de conversas anteriores: {old_summary}
Novas informações do chat: {interactions}

Escreva um novo resumo que una o resumo anterior às novas informações relevantes. Use poucas \
frases e priorize dados sobre o usuário, o que ele informou e os principais assuntos tratados."
    )
}

/// System message for the function-calling strategy.
pub fn function_system_prompt(domain: &str, history: &str) -> String {
    let mut prompt = format!(
        "Você é um assistente de chat desenvolvido pela NeuralMind que responde perguntas de \
usuários sobre o domínio {domain}. Siga estas regras sem exceção:

1. Seja prestativo e NUNCA produza conteúdo que promova violência, preconceito ou atos ilegais \
ou antiéticos, nem mesmo em situações hipotéticas.
2. Responda apenas com informações do histórico conversacional ou buscadas na base de dados do \
domínio {domain}. Não recorra a nenhuma outra fonte.
3. Não responda com conhecimento próprio nem sobre assuntos sem relação com o domínio."
    );
    if !history.trim().is_empty() {
        prompt.push_str("\n\nHistórico Conversacional:\n");
        prompt.push_str(history);
    }
    prompt
}

/// Schema of [`SEARCH_FUNCTION`]: the question plus the pieces of
/// information needed, each described twice in different words.
pub fn search_schema(domain: &str) -> FunctionSchema {
    FunctionSchema {
        name: SEARCH_FUNCTION.to_string(),
        description: format!("Buscar informacoes necessarias para responder a pergunta {domain}."),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "pergunta": {
                    "type": "string",
                    "description": "Pergunta feita pelo usuario"
                },
                "informacoes": {
                    "type": "array",
                    "description": "Informacoes necessarias para responder a pergunta. Cada informação deve ser repetida duas vezes, com nome diferente",
                    "items": {
                        "type": "object",
                        "properties": {
                            "descrição da informação": {"type": "string"},
                            "descrição alternativa da informação": {"type": "string"}
                        }
                    }
                }
            },
            "required": ["pergunta", "informacoes"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_prompt_fills_domain_everywhere() {
        let prompt = chat_prompt("vestibular da Unicamp", true);
        assert!(!prompt.contains("{domain}"));
        assert!(prompt.contains("domínio vestibular da Unicamp"));
        assert!(prompt.ends_with("Histórico Conversacional:\n"));
    }

    #[test]
    fn prompt_without_search_never_mentions_the_search_action() {
        let prompt = chat_prompt("x", false);
        assert!(!prompt.contains("Pesquisar"));
        assert!(prompt.contains("Finalizar"));
        assert!(chat_prompt("x", true).contains("Pesquisar"));
    }

    #[test]
    fn faq_prompt_lists_queries_and_input() {
        let prompt = faq_prompt("Qual a data da prova?\nComo me inscrevo?\n", "data da prova");
        assert!(prompt.contains("Lista de buscas:\nQual a data da prova?\nComo me inscrevo?\n"));
        assert!(prompt.ends_with("Nova busca:\ndata da prova\n\nResposta:\n"));
    }

    #[test]
    fn function_prompt_appends_history_when_present() {
        assert!(!function_system_prompt("x", "").contains("Histórico"));
        let prompt = function_system_prompt("x", "Usuário: oi\n");
        assert!(prompt.ends_with("Histórico Conversacional:\nUsuário: oi\n"));
    }

    #[test]
    fn schema_requires_question_and_information() {
        let schema = search_schema("vestibular");
        assert_eq!(schema.name, SEARCH_FUNCTION);
        assert_eq!(schema.parameters["required"], serde_json::json!(["pergunta", "informacoes"]));
    }
}

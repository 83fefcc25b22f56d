//! Prompt templates for every orchestration phase.

/// Analytical framings rotated across agents in standard and synthesis modes.
pub const FRAMING_PREFIXES: [&str; 5] = [
    "Analyze this request factually and concisely: ",
    "Consider the implications and the wider context of this request: ",
    "Identify the specific requirements and the purpose of this request: ",
    "Think about the most innovative ways to answer this request: ",
    "Examine the technical and practical aspects of this request: ",
];

/// Dimensions explored in collaborative mode, in assignment order.
pub const DIMENSIONS: [&str; 5] = [
    "Fundamental and factual understanding of the subject",
    "Practical aspects and concrete implementation",
    "Broader implications and contextual considerations",
    "Potential challenges and approaches to overcome them",
    "Practical applications and concrete examples",
];

/// Agent `index`'s framed version of `prompt`.
pub fn framed(prompt: &str, index: usize) -> String {
    format!("{}{}", FRAMING_PREFIXES[index % FRAMING_PREFIXES.len()], prompt)
}

pub fn initial_analysis(prompt: &str) -> String {
    format!(
        "Analyze this request in depth to understand its essence, its implicit and explicit \
         expectations, and the level of detail needed to answer it well: {prompt}"
    )
}

pub fn exploration(shared_analysis: &str, dimension: &str, prompt: &str) -> String {
    format!(
        "Based on this initial analysis:\n\n{shared_analysis}\n\n\
         Explore this specific dimension in depth: {dimension}\n\n\
         For the original question: {prompt}\n\n\
         Analyze this dimension in detail, staying aware of the other aspects but \
         concentrating on this one. Think step by step and develop a nuanced, complete analysis."
    )
}

/// Integration prompt over the initial analysis and `(dimension, insight)` pairs.
pub fn integration<'a, I>(initial_analysis: &str, insights: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut prompt = String::from(
        "Organically integrate these analyses into one coherent, unified understanding:\n\n",
    );
    prompt.push_str("Initial understanding of the request:\n");
    prompt.push_str(initial_analysis);
    prompt.push_str("\n\n");

    for (dimension, insight) in insights {
        prompt.push_str(&format!("Dimension: {dimension}\n{insight}\n\n"));
    }

    prompt.push_str(
        "Your task is to synthesize these analyses into an integrated understanding that \
         combines every dimension organically instead of juxtaposing them. \
         Identify the connections, patterns and cross-cutting ideas. \
         Form a unified analysis that reflects a deep collaborative reflection.",
    );
    prompt
}

pub fn final_response(integrated_analysis: &str, prompt: &str) -> String {
    format!(
        "Drawing on this integrated, in-depth analysis:\n\n{integrated_analysis}\n\n\
         Write a direct, clear and complete answer to the original request: {prompt}\n\n\
         The answer must fit the user's implicit and explicit needs and weave in the \
         perspectives of the analyzed dimensions. It must be coherent, structured and as \
         useful as possible. Do not mention the analytical process; focus only on answering \
         the request."
    )
}

pub fn synthesis(results: &[String]) -> String {
    let mut prompt = String::from(
        "Analyze and synthesize the following agent perspectives into one coherent, \
         thorough answer:\n\n",
    );

    for (i, result) in results.iter().enumerate() {
        prompt.push_str(&format!("=== AGENT {} ===\n{}\n\n", i + 1, result));
    }

    prompt.push_str(
        "Your task is to produce a complete synthesis that:\n\
         1. Identifies the points of agreement and disagreement between the agents\n\
         2. Combines the unique perspectives into a coherent view\n\
         3. Presents a conclusion that integrates the best ideas of each agent\n\
         4. Offers a final answer more complete than any single perspective\n\n\
         Synthesis:",
    );
    prompt
}

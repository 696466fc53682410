//! Instruction text sent to the generative model.

use crate::models::RelatedArticle;
use std::fmt::Write;

/// Subject terms that force the English-content block regardless of detected language.
const ENGLISH_TOPICS: &[&str] = &[
    "seo",
    "digital marketing",
    "google",
    "content marketing",
    "social media",
    "analytics",
];

/// Inputs for the body prompt.
#[derive(Debug, Clone, Copy)]
pub struct BodyPrompt<'a> {
    pub title: &'a str,
    pub subject: &'a str,
    pub domain: &'a str,
    pub permalink: &'a str,
    pub language: &'a str,
    pub related: &'a [RelatedArticle],
}

pub fn title_prompt(subject: &str, language: &str) -> String {
    format!(
        "Write a catchy, SEO-optimized article title in {language} about '{subject}'.\n\n\
         RULES:\n\
         1. Grab attention without resorting to clickbait.\n\
         2. Include the keyword \"{subject}\" or a closely related term.\n\
         3. Stay under 60 characters where possible.\n\
         4. Write it in {language}.\n\
         5. A subtitle after a colon or dash is fine when it helps.\n\
         6. No unnecessary punctuation and no all caps.\n\
         7. For English titles, keep the tone professional and concise and use words that drive clicks.\n\n\
         Reply with the title only, no quotes and no extra text."
    )
}

pub fn wants_english_block(language: &str, subject: &str) -> bool {
    let subject = subject.to_lowercase();
    language.eq_ignore_ascii_case("english") || ENGLISH_TOPICS.iter().any(|t| subject.contains(t))
}

fn related_block(domain: &str, related: &[RelatedArticle]) -> String {
    if related.is_empty() {
        return String::new();
    }
    let mut block = String::from("RELATED ARTICLES TO INCLUDE:\n");
    for (i, article) in related.iter().enumerate() {
        let _ = writeln!(
            block,
            "{}. Title: \"{}\", Link: {}{}",
            i + 1,
            article.title,
            domain,
            article.permalink
        );
    }
    block.push_str(
        "Cite each of these links naturally inside the article, using contextual anchor text \
         that relates to both the keyword and the destination article.\n\n",
    );
    block
}

pub fn body_prompt(p: &BodyPrompt<'_>) -> String {
    let BodyPrompt {
        title,
        subject,
        domain,
        permalink,
        language,
        related,
    } = *p;

    let english = if wants_english_block(language, subject) {
        "ENGLISH CONTENT REQUIREMENTS:\n\
         1. Write the whole article in professional, flawless English whatever the keyword language.\n\
         2. Use precise, industry-standard terminology and explain technical terms.\n\
         3. Keep a clear, authoritative tone.\n\
         4. Follow American English spelling and grammar.\n\n"
    } else {
        ""
    };
    let related = related_block(domain, related);

    format!(
        "Write a comprehensive, in-depth SEO-optimized article titled \"{title}\".\n\n\
         FORMAT REQUIREMENTS:\n\
         1. Open with a 3-4 paragraph introduction that links the domain once, in the first paragraph, as [**{domain}**](https://{domain}).\n\
         2. Right after the introduction add the placeholder [IMAGE: {subject} overview infographic].\n\
         3. Structure the body with markdown H2, H3 and H4 headings (##, ###, ####), starting with H2 after the introduction.\n\
         4. Aim for 4000-7000 words of detailed, professional analysis.\n\
         5. Bold 5-7 primary and secondary keywords related to '{subject}'.\n\
         6. Add 6-7 more placeholders in the form [IMAGE: description related to the heading], each placed BEFORE its heading.\n\
         7. Never put a placeholder in the conclusion or at the very end.\n\
         8. Finish with a warm conclusion addressed to the reader, then a call to action linking [**{domain}{permalink}**](https://{domain}{permalink}) with the article title as anchor text.\n\n\
         {english}\
         {related}\
         CONTENT REQUIREMENTS:\n\
         1. Cover '{subject}' with expert depth: real examples, case studies, statistics and step-by-step instructions.\n\
         2. Write in an authoritative {language} tone and address the reader as 'you'.\n\
         3. Add 6-8 external links to authoritative sources with descriptive anchor text.\n\
         4. Keep the keyword '{subject}' at a 2-3% density without stuffing.\n\
         5. Work in 10-15 semantically related (LSI) terms.\n\
         6. Turn 7-8 LSI phrases into internal links of the form [**{domain}/keyword-phrase**](https://{domain}/keyword-phrase), hyphenating the URL part.\n\
         7. Include at least one related-article link per major section when related articles are given.\n\
         8. No table of contents and no FAQ section; answer questions inside the relevant sections.\n\
         9. Use 2-3 bulleted lists, 2-3 numbered lists and at least one markdown table.\n\
         10. Keep headings under 60 characters, specific and keyword-rich; mix numbers, how-to and question forms.\n\
         11. Give each H2 2-3 H3 subsections and at least one H4 for deeper detail.\n"
    )
}

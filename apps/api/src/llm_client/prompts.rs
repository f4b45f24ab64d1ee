// Prompt templates and fixed request parameters for the upstream AI services.

/// DeepSeek chat model used for copy generation.
pub const TEXT_MODEL: &str = "deepseek-chat";
pub const TEXT_TEMPERATURE: f32 = 0.7;
pub const TEXT_MAX_TOKENS: u32 = 300;

/// Recraft output size and format.
pub const IMAGE_SIZE: &str = "1024x1024";
pub const IMAGE_RESPONSE_FORMAT: &str = "url";
pub const DEFAULT_STYLE_ID: &str = "b7f1e039-5fb5-47fa-b46e-d886bc87e36c";

const COPY_TEMPLATE: &str = "\
You are given a user request in plain natural language.
Your task is to transform it into structured content for a layout.
Always output in the following format:

  HEADER: [main headline text]
  SUBHEADER: [secondary headline - optional]
  BODY: [main description text - optional]
  CAPTION: [supporting text - optional]
  LOGO: [brand/company name - optional]
  IMAGE: [detailed image generation prompt]

Rules:
1. HEADER is MANDATORY - always provide a compelling main headline.

2. Detect if the request contains specific items such as phone numbers, emails, websites, dates, or times.
   - Do NOT modify these values.
   - Place them naturally into CAPTION (preferred) or another fitting field.

3. Decide how many text blocks are appropriate:
   - Minimal: HEADER + SUBHEADER
   - Extended: HEADER + SUBHEADER + BODY + CAPTION (and optional LOGO, IMAGE)
   - Flexible: Add or skip fields depending on the request.

4. Write each field clearly and concisely:
   - HEADER: 3–8 words, catchy and MANDATORY
   - SUBHEADER: one clear supporting sentence
   - BODY: 1–3 sentences or bullet points, optional
   - CAPTION: short supporting note, call-to-action, or place to include unmodified specifics (like phone, website, date, time)
   - LOGO: if the user specifies a company/brand name, put it here
   - IMAGE: always generate a clean descriptive image prompt that reflects the request

5. Do not add explanations. Output only the structured content.

User request:
";

/// Full instruction sent as the single user message to the text model.
pub fn copy_prompt(user_prompt: &str) -> String {
    format!("{COPY_TEMPLATE}\"{user_prompt}\"")
}

/// Visual-only image prompt. Keeps lettering out of the generated artwork so it
/// never competes with the layout's own text blocks.
pub fn image_prompt(user_prompt: &str) -> String {
    format!(
        "Abstract geometric composition, minimalist design elements, clean shapes and forms \
         related to: {user_prompt}. No text, no words, no letters. Pure visual illustration \
         with geometric patterns, gradients, and modern design elements."
    )
}

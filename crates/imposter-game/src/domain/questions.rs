//! Question bank and fallback answers.

use imposter_core::model::{Language, Round};
use imposter_core::rng::{DeterministicRng, pick_index};

const QUESTIONS_EN: &[&str] = &[
    "What is your favorite weekend activity?",
    "Describe your ideal vacation destination.",
    "What was the last book you enjoyed reading?",
    "If you could learn any new skill instantly, what would it be?",
    "What is a food you never get tired of?",
    "What's your go-to comfort food after a long day?",
    "Are you an early bird or a night owl, and why?",
    "Which song have you been replaying lately?",
    "What's a hobby you do to unwind after work or school?",
    "Coffee or tea—how do you like it?",
    "What's one small thing that always improves your day?",
    "What's your favorite way to spend a rainy afternoon?",
];

const QUESTIONS_KO: &[&str] = &[
    "주말에 가장 좋아하는 활동은 무엇인가요?",
    "이상적인 휴가지에 대해 설명해 주세요.",
    "최근에 재미있게 읽은 책은 무엇인가요?",
    "새로운 기술을 바로 배울 수 있다면 무엇을 배우고 싶나요?",
    "질리지 않고 계속 먹을 수 있는 음식은 무엇인가요?",
    "긴 하루 끝에 찾게 되는 소울푸드는 무엇인가요?",
    "아침형인가요, 저녁형인가요? 그 이유는?",
    "요즘 자주 반복해서 듣는 노래는 무엇인가요?",
    "퇴근/하교 후 마음을 풀기 위해 하는 취미가 있나요?",
    "커피와 차 중 무엇을 더 선호하고, 어떻게 마시는 편인가요?",
    "하루를 조금 더 좋게 만드는 작은 습관은 무엇인가요?",
    "비 오는 오후를 가장 좋아하는 보내는 방법은 무엇인가요?",
];

const FALLBACK_EN: &[&str] = &[
    "I'm not sure how to answer that right now.",
    "That's an interesting question. I'd have to think about it.",
    "That's a tough one. Let me get back to you on that.",
    "I'm drawing a blank on that question.",
];

const FALLBACK_KO: &[&str] = &[
    "지금은 어떻게 답해야 할지 잘 모르겠어요.",
    "그건 좀 어려운 질문이네요.",
    "그 질문에 대해서는 좀 더 생각해봐야 할 것 같아요.",
];

/// Every question available in `language`.
#[must_use]
pub fn question_bank(language: Language) -> &'static [&'static str] {
    match language {
        Language::En => QUESTIONS_EN,
        Language::Ko => QUESTIONS_KO,
    }
}

/// Picks the next question, skipping questions already asked in `rounds`
/// until the bank runs dry.
pub fn next_question(
    language: Language,
    rounds: &[Round],
    rng: &mut dyn DeterministicRng,
) -> String {
    let bank = question_bank(language);
    let fresh: Vec<&str> = bank
        .iter()
        .copied()
        .filter(|q| !rounds.iter().any(|r| r.question == *q))
        .collect();
    let pool = if fresh.is_empty() { bank.to_vec() } else { fresh };
    pool[pick_index(rng, pool.len())].to_owned()
}

/// The canned answer used when the generator fails for `round`.
#[must_use]
pub fn fallback_answer(language: Language, round: u32) -> &'static str {
    let pool = match language {
        Language::En => FALLBACK_EN,
        Language::Ko => FALLBACK_KO,
    };
    pool[round as usize % pool.len()]
}

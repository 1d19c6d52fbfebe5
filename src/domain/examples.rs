// ============================================================
// Layer 3 — Example Entries
// ============================================================
// The four (question, context) rows listed under the form.
// Selecting one pre-fills both inputs.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleEntry {
    pub question: &'static str,
    pub context:  &'static str,
}

pub const EXAMPLES: [ExampleEntry; 4] = [
    ExampleEntry {
        question: "Which country contains the majority of the Amazon rainforest?",
        context:  "The Amazon rainforest, also called Amazon jungle or Amazonia, is a moist broadleaf tropical rainforest in the Amazon biome that covers most of the Amazon basin of South America. The majority of the forest, 60%, is in Brazil, followed by Peru with 13%, Colombia with 10%, and smaller portions in Venezuela, Ecuador, Bolivia, Guyana, Suriname, and French Guiana.",
    },
    ExampleEntry {
        question: "Who developed the theory of relativity?",
        context:  "The theory of relativity usually encompasses two interrelated physics theories by Albert Einstein: special relativity and general relativity, proposed and published in 1905 and 1915, respectively. Special relativity applies to all physical phenomena in the absence of gravity. General relativity explains the law of gravitation and its relation to the forces of nature.",
    },
    ExampleEntry {
        question: "When did construction of the Great Wall begin?",
        context:  "The Great Wall of China is a series of fortifications that were built across the historical northern borders of ancient Chinese states and Imperial China as protection against various nomadic groups. Several walls were built from as early as the 7th century BC, with selective stretches later joined by Qin Shi Huang (220–206 BC), the first emperor of China.",
    },
    ExampleEntry {
        question: "What is the speed of light?",
        context:  "The speed of light in vacuum, commonly denoted c, is a universal physical constant that is exactly equal to 299,792,458 metres per second (approximately 300,000 kilometres per second or 186,000 miles per second). According to the special theory of relativity, c is the upper limit for the speed at which conventional matter or energy can travel through space.",
    },
];

/// Look up an example by its 0-based row index.
pub fn example(index: usize) -> Option<&'static ExampleEntry> {
    EXAMPLES.get(index)
}

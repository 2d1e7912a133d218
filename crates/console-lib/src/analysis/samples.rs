/// Example incident narratives offered to operators
pub const SAMPLE_NARRATIVES: [&str; 5] = [
    "A person entered a house through an open window and stole jewelry worth ₹50,000 while the residents were sleeping.",
    "Two individuals got into a heated argument at a restaurant, which escalated into a physical fight causing injuries to both parties.",
    "A person was driving under the influence of alcohol and caused an accident that resulted in serious injuries to a pedestrian.",
    "Someone used a fake identity document to open a bank account and later used it for fraudulent transactions.",
    "A group of people gathered in a public place and started shouting slogans without proper permission, causing disturbance to the public.",
];

/// Sample by 1-based index
pub fn sample_narrative(index: usize) -> Option<&'static str> {
    index
        .checked_sub(1)
        .and_then(|i| SAMPLE_NARRATIVES.get(i))
        .copied()
}

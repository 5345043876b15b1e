//! Prompt construction for the generation endpoints.
//!
//! The prompts pin the model to a strict JSON shape; the client rejects
//! anything that does not parse into it.

use super::RoadmapRequest;

/// Prompt for a study roadmap.
///
/// A syllabus, when present, anchors the content; otherwise the subject
/// line does.
pub fn roadmap(request: &RoadmapRequest) -> String {
    let source = match (&request.syllabus, &request.subject) {
        (Some(syllabus), _) => format!("Base the roadmap on this syllabus:\n{}", syllabus),
        (None, Some(subject)) => format!("The subject is: {}", subject),
        (None, None) => String::new(),
    };

    format!(
        "You are an expert curriculum designer. Create a study roadmap.\n\
         {source}\n\
         Timeline: {timeline}. Difficulty: {difficulty}.\n\
         \n\
         Respond with ONLY a JSON object, no prose and no markdown, in \
         exactly this shape:\n\
         {{\n\
           \"modules\": [\n\
             {{\n\
               \"title\": \"string\",\n\
               \"description\": \"string\",\n\
               \"keyTopics\": [\"string\"],\n\
               \"resources\": [\"string\"],\n\
               \"estimatedDuration\": \"string\",\n\
               \"order\": 1\n\
             }}\n\
           ]\n\
         }}\n\
         Modules must be ordered, with `order` starting at 1, and sized so \
         the full roadmap fits the timeline.",
        source = source,
        timeline = request.timeline,
        difficulty = request.difficulty,
    )
}

/// Prompt for a batch of flashcards on a topic.
pub fn flashcards(topic: &str, difficulty: &str, count: u32) -> String {
    format!(
        "You are a study assistant. Create exactly {count} flashcards about \
         \"{topic}\" at {difficulty} difficulty.\n\
         \n\
         Respond with ONLY a JSON array, no prose and no markdown, in \
         exactly this shape:\n\
         [\n\
           {{\n\
             \"front_content\": \"question or term\",\n\
             \"back_content\": \"answer or definition\",\n\
             \"hint\": \"optional hint, may be empty\"\n\
           }}\n\
         ]",
        count = count,
        topic = topic,
        difficulty = difficulty,
    )
}

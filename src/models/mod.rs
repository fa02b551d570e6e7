pub mod labels;
pub mod loaders;
pub mod question;
pub mod rules;
pub mod unit;

pub use loaders::{load_all_job_files, load_job_file, GenerationJob};
pub use question::{
    AnswerKey, AnswerKeyItem, CoverageMap, GeneratedQuestion, Provenance, QuestionPaper,
};
pub use rules::{Difficulty, GenerationRules, QuestionSpecItem, QuestionType};
pub use unit::{Syllabus, SyllabusOutline, Unit};

pub mod exam;
pub mod loaders;
pub mod question;

pub use exam::{
    CognitiveLevel, EducationLevel, ExamConfig, GeneratedExam, LanguageStyle, LearningPurpose,
    QuestionType, TeacherIdType, TeacherInfo,
};
pub use loaders::{load_exam, load_exam_config, save_exam};
pub use question::{Question, QuestionImage, QuestionPatch};

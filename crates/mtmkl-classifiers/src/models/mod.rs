pub mod baseline;
pub mod classifier_trait;
pub mod mtmkl;
pub mod platt;
pub mod svm;

pub use baseline::MajorityClassifier;
pub use classifier_trait::ClassifierModel;
pub use mtmkl::{MtmklClassifier, TaskModel};

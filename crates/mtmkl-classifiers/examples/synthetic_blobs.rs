use anyhow::Result;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use mtmkl_classifiers::config::MtmklConfig;
use mtmkl_classifiers::models::{ClassifierModel, MajorityClassifier, MtmklClassifier};
use mtmkl_classifiers::preprocessing::StandardScaler;

fn main() -> Result<()> {
    env_logger::init();

    // Three noisy blobs in 2D, 20 samples each
    let centers = [(0.0, 0.0), (2.5, 0.5), (0.5, 2.5)];
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut data = Vec::new();
    let mut y = Vec::new();
    for (class, (cx, cy)) in centers.iter().enumerate() {
        for _ in 0..20 {
            data.push(cx + rng.gen_range(-0.8..0.8));
            data.push(cy + rng.gen_range(-0.8..0.8));
            y.push(class as i32);
        }
    }
    let x = Array2::from_shape_vec((y.len(), 2), data)?;
    let (_, x) = StandardScaler::fit_transform(x.view())?;

    println!("Synthetic X shape: {:?}", x.shape());

    let mut clf = MtmklClassifier::new(MtmklConfig::default());
    clf.fit(x.view(), &y)?;

    for (class, weights) in clf.kernel_importances()? {
        println!("class {}: {:?}", class, weights);
    }

    let mut baseline = MajorityClassifier::new();
    baseline.fit(x.view(), &y)?;
    println!(
        "training accuracy {:.3} (majority baseline {:.3})",
        clf.score(x.view(), &y)?,
        baseline.score(x.view(), &y)?
    );

    let proba = clf.predict_proba(x.view())?;
    println!("first rows of predict_proba:\n{:.3}", proba.slice(ndarray::s![..3, ..]));
    Ok(())
}
